//! # noema-server
//!
//! Binary entry point: tracing init, configuration from the environment,
//! router assembly, and the listener loop.

use tracing_subscriber::EnvFilter;

use noema_api::state::AppState;
use noema_core::NoemaConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = NoemaConfig::from_env();
    if config.judge_key.is_empty() {
        tracing::warn!("JUDGE_KEY not set; gated routes will reject all requests");
    }
    if config.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY not set; evaluator disabled, stub results only");
    }

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = noema_api::app(AppState::from_config(config));

    tracing::info!(%addr, "noema server listening");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
        std::process::exit(1);
    }
}
