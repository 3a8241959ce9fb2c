//! Voice Agent Server Entry Point

use std::net::SocketAddr;

use voice_agent_config::load_settings;
use voice_agent_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = match load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Warning: failed to load configuration: {e}. Using defaults.");
            voice_agent_config::Settings::default()
        }
    };

    init_tracing();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting voice agent server");

    let bind_addr = settings.server.bind_addr.clone();
    let state = AppState::build(settings).await?;
    let app = create_router(state);

    let addr: SocketAddr = bind_addr.parse()?;
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "voice_agent=info,tower_http=debug".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}
