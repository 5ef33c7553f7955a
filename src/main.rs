//! Cloud Logging structured logging service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     X-Cloud-Trace-Context: <trace>/<span>
//!     ──────────────────────────┐
//!                               ▼
//!                     ┌───────────────────┐      ┌──────────────────┐
//!                     │ CloudTraceLayer   │─────▶│ route handler    │
//!                     │ (Context)         │      │ logger.info(ctx) │
//!                     └───────────────────┘      └────────┬─────────┘
//!                                                         ▼
//!                     ┌───────────────────┐      ┌──────────────────┐
//!     stderr  ◀───────│ JsonHandler       │◀─────│ CloudLogging-    │
//!     (one JSON line) │ (renamed keys)    │      │ Handler (+trace) │
//!                     └───────────────────┘      └──────────────────┘
//! ```
//!
//! # Startup
//! - Load configuration (file, then environment)
//! - Install the logging subscriber
//! - Resolve the project id; failure is fatal
//! - Bind the listener and serve

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cloud_logging::config;
use cloud_logging::http::HttpServer;
use cloud_logging::logging;
use cloud_logging::trace::ProjectId;

#[derive(Parser)]
#[command(name = "cloud-logging")]
#[command(about = "HTTP service emitting Cloud Logging structured logs", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref())?;
    let logger = logging::init(&config.logging)?;

    tracing::info!("cloud-logging v0.1.0 starting");

    let project = match ProjectId::resolve(&config.project).await {
        Ok(project) => project,
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve project id");
            return Err(e.into());
        }
    };

    tracing::info!(
        project_id = %project,
        bind_address = %config.listener.bind_address(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        port = local_addr.port(),
        "Listening for connections"
    );

    let server = HttpServer::new(config, project, logger);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
