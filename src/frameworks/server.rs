// Framework bootstrap for the tactics server runtime.

use crate::frameworks::config;
use crate::interface_adapters::clients::auth::AuthClient;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::{AppState, InMemoryMatchStore, SystemClock};
use crate::use_cases::{MatchRegistry, MatchSettings};

use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_with_auth(listener, config::auth_service_url()).await
}

// Same as `run`, verifying tokens against the auth service at `auth_base_url`.
pub async fn run_with_auth(listener: tokio::net::TcpListener, auth_base_url: String) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(auth_base_url)?;
    let app = app(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(auth_base_url: String) -> Result<AppState> {
    let auth_verify_timeout = config::auth_verify_timeout();
    let auth_client = AuthClient::new(auth_base_url.clone(), auth_verify_timeout)
        .map_err(|e| std::io::Error::other(format!("failed to initialize auth client: {e}")))?;
    tracing::debug!(
        auth_base_url = %auth_base_url,
        auth_verify_timeout_ms = auth_verify_timeout.as_millis(),
        "auth client configured"
    );

    // Owns every live match; documents stay in process memory.
    let registry = MatchRegistry::new(
        MatchSettings {
            event_capacity: config::match_event_capacity(),
            ..MatchSettings::default()
        },
        Arc::new(InMemoryMatchStore::default()),
        Arc::new(SystemClock),
    );

    Ok(AppState {
        registry: Arc::new(registry),
        verifier: Arc::new(auth_client),
    })
}
