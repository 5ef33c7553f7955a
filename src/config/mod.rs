//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, or defaults)
//!     → environment overrides (PORT, GOOGLE_CLOUD_PROJECT, GCE_METADATA_HOST)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file, matching how the platform injects settings

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_config, ConfigError};
pub use schema::{ListenerConfig, LoggingConfig, ProjectConfig, ServiceConfig, TimeoutConfig};
pub use validation::ValidationError;
