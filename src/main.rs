use std::env;
use std::path::PathBuf;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voxcall::{ServerConfig, routes, state::AppState};

/// Parsed command line
struct Cli {
    check_only: bool,
    config_path: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Cli> {
    let mut cli = Cli {
        check_only: false,
        config_path: None,
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "check-config" => cli.check_only = true,
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                cli.config_path = Some(PathBuf::from(path));
            }
            other => {
                anyhow::bail!(
                    "Unknown argument '{other}'. Usage: voxcall [check-config] [--config <file>]"
                );
            }
        }
    }

    Ok(cli)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = parse_args()?;

    // Load configuration
    let config = match &cli.config_path {
        Some(path) => ServerConfig::from_file(path),
        None => ServerConfig::from_env(),
    }
    .map_err(|e| anyhow!("Invalid configuration: {e}"))?;

    if cli.check_only {
        println!("Configuration OK\n{}", config.summary());
        return Ok(());
    }

    let address = config.address();
    let voicemail_tick = config.voicemail_tick();

    // Create application state
    let app_state = AppState::new(config).map_err(|e| anyhow!("Failed to initialize: {e}"))?;
    let ticker = app_state
        .core_state
        .spawn_voicemail_ticker(voicemail_tick);

    let app = routes::create_app(app_state.clone());

    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.abort();
    if let Some(req_manager) = app_state.core_state.req_manager() {
        info!("Provider traffic: {}", req_manager.metrics().summary());
    }
    info!("Server stopped");

    Ok(())
}
