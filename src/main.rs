use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use glutton::config::load_config;
use glutton::lifecycle::{shutdown_signal, Shutdown};
use glutton::observability::{logging, metrics};
use glutton::{ComponentRegistry, GluttonServer, StartupError};

#[derive(Parser)]
#[command(name = "glutton")]
#[command(version, about = "Configurable HTTP ingestion endpoint", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.file.as_deref(), cli.debug).map_err(StartupError::from)?;
    logging::init_logging(config.debug, cli.log_json);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "glutton starting");
    tracing::info!(
        bind_address = %config.bind_address(),
        routes = config.settings.len(),
        request_timeout_secs = config.request_timeout_secs,
        max_body_bytes = config.max_body_bytes,
        "Configuration loaded"
    );

    if config.metrics_enabled {
        let addr = config.metrics_address.parse()?;
        metrics::init_metrics(addr).map_err(StartupError::from)?;
    }

    let registry = ComponentRegistry::with_builtins();
    let bind_address = config.bind_address();
    let server = GluttonServer::new(config, &registry)?;

    let listener = TcpListener::bind(&bind_address).await.map_err(StartupError::from)?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let stopped = shutdown.subscribe();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.trigger();
        }
    });

    server.run(listener, stopped).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
