//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the example handler
//! - Wire up middleware (cloud trace context, tracing, timeout)
//! - Bind server to listener and shut down gracefully

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::http::middleware::CloudTraceLayer;
use crate::logging::{Attr, Logger};
use crate::trace::{Context, ProjectId};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub logger: Logger,
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server. `project` is the already-resolved project id.
    pub fn new(config: ServiceConfig, project: ProjectId, logger: Logger) -> Self {
        let state = AppState { logger };
        let router = Self::build_router(&config, project, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The trace layer is outermost so that tower-http's request events are
    /// already inside the request's context.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, project: ProjectId, state: AppState) -> Router {
        Router::new()
            .route("/", any(index))
            .route("/{*path}", any(index))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(CloudTraceLayer::new(project))
    }

    /// The assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}

/// Example handler: logs one structured record against the request context.
async fn index(State(state): State<AppState>, ctx: Context) -> Response {
    let attrs = [Attr::new("mycount", 42), Attr::new("mystring", "myvalue")];
    match state.logger.info(&ctx, "my message", attrs) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to write log record");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Wait for Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
