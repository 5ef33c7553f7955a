//! Structured logging subsystem.
//!
//! # Data Flow
//! ```text
//! Logger::info(ctx, ...)        tracing::info!(...)
//!     → record.rs                  → layer.rs (event → Record, Context::current())
//!             ╲                   ╱
//!              cloud.rs (CloudLoggingHandler: add trace from Context)
//!     → json.rs (JsonHandler: replace_attr renames keys, one line per record)
//!     → stderr
//! ```
//!
//! # Design Decisions
//! - `Handler` is the seam: backends and decorators implement the same trait
//! - Output is newline-delimited JSON, written synchronously
//! - Backend errors reach `Logger` callers unchanged

pub mod cloud;
pub mod handler;
pub mod init;
pub mod json;
pub mod layer;
pub mod logger;
pub mod record;

#[cfg(test)]
pub(crate) mod test_support;

pub use cloud::{CloudLoggingHandler, LEVEL_CRITICAL, TRACE_KEY};
pub use handler::{Handler, LogError};
pub use init::{init, InitError};
pub use json::{HandlerOptions, JsonHandler};
pub use layer::CloudLoggingLayer;
pub use logger::Logger;
pub use record::{Attr, Level, Record, Source, Value};
