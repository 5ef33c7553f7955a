//! Process-wide logging setup.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::logging::cloud::{self, CloudLoggingHandler};
use crate::logging::json::HandlerOptions;
use crate::logging::layer::CloudLoggingLayer;
use crate::logging::record::ParseLevelError;
use crate::logging::Logger;

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "cloud_logging=debug,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Level(#[from] ParseLevelError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the Cloud Logging handler as the global `tracing` subscriber and
/// return a [`Logger`] writing through the same handler.
pub fn init(config: &LoggingConfig) -> Result<Logger, InitError> {
    let level = cloud::parse_severity(&config.level)?;
    let options = HandlerOptions {
        add_source: config.add_source,
        ..cloud::options(level)
    };
    let handler = Arc::new(CloudLoggingHandler::new(std::io::stderr(), options));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(CloudLoggingLayer::new(handler.clone()))
        .try_init()?;

    Ok(Logger::new(handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_level_before_installing() {
        let config = LoggingConfig {
            level: "chatty".into(),
            ..Default::default()
        };
        assert!(matches!(init(&config), Err(InitError::Level(_))));
    }
}
