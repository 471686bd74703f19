//! Request catcher server binary
//!
//! Run with: request-catcher [CONFIG_FILE]
//!
//! Configuration comes from defaults, then environment variables
//! (`HTTP_PORT`, `HOST`, `ROOT_HOST`, `FRONTEND_DIR`, `FAVICON`,
//! `REDIRECT_DEST`, `MAX_BODY_SIZE`, `VIEWER_QUEUE_CAPACITY`), then the JSON
//! file if one is given.

use std::path::PathBuf;

use clap::Parser;
use request_catcher::{CatcherServer, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "request-catcher", version, about)]
struct Cli {
    /// JSON configuration file
    #[arg(env = "CONFIG_FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> request_catcher::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("request_catcher=info")),
        )
        .init();

    let cli = Cli::parse();
    let config_file = cli.config.filter(|path| !path.as_os_str().is_empty());
    let config = ServerConfig::load(config_file.as_deref())?;

    let server = CatcherServer::new(config);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await
}
