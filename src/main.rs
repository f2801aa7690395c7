use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mockbot::config::Config;
use mockbot::{commands, server, Dispatcher, HttpFileFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mockbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Bind: {}", config.server.bind);
    info!("  Link base: {}", config.links.base_url);

    let dispatcher = Arc::new(Dispatcher::new(
        commands::builtin_handlers(&config.links.base_url),
        config.auth.api_psk.clone(),
        Arc::new(HttpFileFetcher::new()),
    ));
    info!("  Handlers: {:?}", dispatcher.registry().events());

    info!("Bot endpoint is starting...");
    server::serve(&config.server.bind, dispatcher).await?;

    Ok(())
}
