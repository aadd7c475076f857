// Shared one-time server bootstrap for integration tests.
use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::{Value, json};
use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

// Base URL published once the server has bound its port.
static SERVER_URL: OnceLock<String> = OnceLock::new();
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Ensure the test server is running and return the shared base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // An OS thread keeps the server alive across individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let auth_url = spawn_fake_auth().await;
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                tactics_server::frameworks::server::run_with_auth(listener, auth_url)
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Bearer token the fake auth service accepts for `player_id`.
#[allow(dead_code)]
pub fn token_for(player_id: u64) -> String {
    format!("player-{player_id}")
}

// Stand-in auth service: `player-<id>` verifies as user `<id>`, anything else is a 401.
async fn spawn_fake_auth() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake auth port");
    let addr = listener.local_addr().expect("get fake auth addr");
    let router = Router::new().route("/auth/verify-token", post(verify_token));
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake auth failed");
    });
    format!("http://{addr}")
}

async fn verify_token(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let user_id = body["token"]
        .as_str()
        .and_then(|token| token.strip_prefix("player-"))
        .and_then(|id| id.parse::<u64>().ok());

    match user_id {
        Some(user_id) => (
            StatusCode::OK,
            Json(json!({
                "user_id": user_id,
                "display_name": "Pilot",
                "session_id": format!("session-{user_id}"),
                "expires_at": u64::MAX,
            })),
        ),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "invalid token" }))),
    }
}

fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}
