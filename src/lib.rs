//! Cloud Logging structured logs with request trace correlation.

pub mod config;
pub mod http;
pub mod logging;
pub mod trace;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use logging::Logger;
