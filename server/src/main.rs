use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use globe_server::config::ServerConfig;
use globe_server::globe_loop::{run_globe_loop, GlobeBroadcast, GlobeCommand};
use globe_server::history::load_history;
use globe_server::http::build_router;
use globe_server::state::GlobeState;
use globe_server::ws::AppState;
use tokio::sync::{broadcast, mpsc, Semaphore};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Overrides `listen_addr` from the config file
    #[clap(long)]
    pub listen_addr: Option<String>,

    /// Play history to load at startup. Overrides `history_path`.
    #[clap(long)]
    pub history: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let mut config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            ServerConfig::load(path)?
        }
        None => ServerConfig::default(),
    };
    if let Some(listen_addr) = cli_args.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(history) = cli_args.history {
        config.history_path = Some(history);
    }
    config.validate()?;

    info!("Configuration loaded:");
    info!("  listen_addr: {}", config.listen_addr);
    info!("  strategy: {:?}", config.globe.strategy);
    info!("  max_nodes: {}", config.globe.max_nodes);

    let mut state = GlobeState::new(config.globe.clone(), config.shuffle_seed);
    if let Some(path) = &config.history_path {
        let records = load_history(path).await?;
        info!("Loaded {} records from {:?}", records.len(), path);
        state.replace_history(records);
    }

    let (globe_tx, globe_rx) = mpsc::channel::<GlobeCommand>(256);
    let (broadcast_tx, _) = broadcast::channel::<GlobeBroadcast>(config.broadcast_capacity);

    tokio::spawn(run_globe_loop(globe_rx, broadcast_tx.clone(), state));

    let app_state = AppState {
        globe_tx,
        broadcast_tx,
        globe_config: config.globe.clone(),
        connection_semaphore: Arc::new(Semaphore::new(config.max_connections)),
    };
    let app = build_router(app_state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!("Music globe server listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
