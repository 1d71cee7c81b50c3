use clap::Parser;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use writing_relay::client::AnthropicClient;
use writing_relay::config::RelayConfig;
use writing_relay::handler::{AppState, router};

#[derive(Parser, Debug)]
#[command(name = "writing-relay", about = "Streaming relay for an AI writing assistant")]
struct Args {
    /// Path to a TOML config file; falls back to environment variables
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen address from config
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RelayConfig::from_file(path)?,
        None => RelayConfig::from_env()?,
    };
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    config.validate()?;

    info!(listen = %config.server.listen_addr, model = %config.anthropic.model, "Starting relay");

    let state = Arc::new(AppState {
        client: AnthropicClient::new(config.anthropic.clone())?,
    });

    // The browser frontend runs on a different origin in every deployment,
    // so the relay answers any origin, like the original service did.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr).await?;
    info!("Relay ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}
