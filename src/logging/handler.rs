//! Handler capability shared by every log backend and decorator.

use std::sync::Arc;

use crate::logging::record::{Attr, Level, Record};
use crate::trace::Context;

/// Error raised while emitting a record.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to write log record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A log backend.
///
/// Decorators hold another `Arc<dyn Handler>` and delegate to it; derived
/// handlers (`with_attrs`, `with_group`) are new values and leave `self`
/// untouched.
pub trait Handler: Send + Sync {
    /// Whether records at `level` would be emitted.
    fn enabled(&self, ctx: &Context, level: Level) -> bool;

    /// Emit one record.
    fn handle(&self, ctx: &Context, record: &Record) -> Result<(), LogError>;

    /// A handler that adds `attrs` to every record.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler>;

    /// A handler that nests all later attributes under `name`.
    fn with_group(&self, name: &str) -> Arc<dyn Handler>;
}
