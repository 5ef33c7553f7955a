//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file, and
//! every field has a default so an empty file (or no file) is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Project id resolution.
    pub project: ProjectConfig,

    /// Structured logging settings.
    pub logging: LoggingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to listen on. Overridden by `PORT`.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Where the cloud project id comes from.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Explicit project id. Overridden by `GOOGLE_CLOUD_PROJECT`.
    pub project_id: Option<String>,

    /// Metadata server `host[:port]`. Overridden by `GCE_METADATA_HOST`.
    pub metadata_host: Option<String>,

    /// Metadata query timeout in seconds.
    pub metadata_timeout_secs: u64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            metadata_host: None,
            metadata_timeout_secs: 5,
        }
    }
}

/// Structured logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum severity: trace, debug, info, warn, error or critical.
    pub level: String,

    /// Emit `logging.googleapis.com/sourceLocation`.
    pub add_source: bool,

    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            add_source: true,
            filter: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.listener.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.add_source);
    }

    #[test]
    fn partial_sections() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [listener]
            port = 9090

            [project]
            project_id = "myproj"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.listener.port, 9090);
        assert_eq!(config.project.project_id.as_deref(), Some("myproj"));
        assert_eq!(config.project.metadata_timeout_secs, 5);
    }
}
