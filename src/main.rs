#[tokio::main]
async fn main() -> std::io::Result<()> {
    tactics_server::frameworks::server::run_with_config().await
}
