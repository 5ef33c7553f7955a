//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0)
//! - Check the logging level is one the handler understands
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::ServiceConfig;
use crate::logging::cloud::parse_severity;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("unknown logging level '{0}'")]
    UnknownLevel(String),

    #[error("project.metadata_timeout_secs must be greater than 0")]
    ZeroMetadataTimeout,

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("invalid port '{0}'")]
    InvalidPort(String),
}

/// Check a configuration, collecting every error.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if parse_severity(&config.logging.level).is_err() {
        errors.push(ValidationError::UnknownLevel(config.logging.level.clone()));
    }
    if config.project.metadata_timeout_secs == 0 {
        errors.push(ValidationError::ZeroMetadataTimeout);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
