//! Cloud Logging structured output.
//!
//! The logging agent picks up JSON lines from stderr and treats a few keys
//! specially: `message`, `severity`, `logging.googleapis.com/sourceLocation`
//! and `logging.googleapis.com/trace`. This module renames the JSON backend's
//! built-in keys accordingly and attaches the request's trace resource name so
//! entries are grouped under the request log.

use std::borrow::Cow;
use std::io::Write;
use std::sync::Arc;

use crate::logging::handler::{Handler, LogError};
use crate::logging::json::{self, HandlerOptions, JsonHandler};
use crate::logging::record::{Attr, Level, ParseLevelError, Record, Value};
use crate::trace::Context;

pub const MESSAGE_KEY: &str = "message";
pub const SEVERITY_KEY: &str = "severity";
pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";

/// Extra level understood by Cloud Logging, above `ERROR`.
pub const LEVEL_CRITICAL: Level = Level::new(12);

/// Rename the JSON backend's built-in keys to the Cloud Logging ones.
pub fn replace_attr(groups: &[String], mut attr: Attr) -> Attr {
    if !groups.is_empty() {
        return attr;
    }

    match attr.key.as_str() {
        json::MESSAGE_KEY => attr.key = MESSAGE_KEY.to_string(),
        json::SOURCE_KEY => attr.key = SOURCE_LOCATION_KEY.to_string(),
        json::LEVEL_KEY => {
            attr.key = SEVERITY_KEY.to_string();
            if attr.value.as_level() == Some(LEVEL_CRITICAL) {
                attr.value = Value::String("CRITICAL".to_string());
            }
        }
        _ => {}
    }
    attr
}

/// JSON backend options producing Cloud Logging output at `level`.
pub fn options(level: Level) -> HandlerOptions {
    HandlerOptions {
        add_source: true,
        level,
        replace_attr: Some(Arc::new(replace_attr)),
    }
}

/// Parse a level name, accepting `critical` on top of the standard names.
pub fn parse_severity(s: &str) -> Result<Level, ParseLevelError> {
    if s.trim().eq_ignore_ascii_case("critical") {
        Ok(LEVEL_CRITICAL)
    } else {
        s.parse()
    }
}

/// Handler adding the request's trace to every record before delegating.
#[derive(Clone)]
pub struct CloudLoggingHandler {
    inner: Arc<dyn Handler>,
}

impl CloudLoggingHandler {
    /// Cloud Logging JSON output to `writer`.
    pub fn new<W>(writer: W, options: HandlerOptions) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::wrap(Arc::new(JsonHandler::new(writer, options)))
    }

    /// Cloud Logging JSON output to the process's stderr.
    pub fn stderr(level: Level) -> Self {
        Self::new(std::io::stderr(), options(level))
    }

    /// Decorate an existing handler.
    pub fn wrap(inner: Arc<dyn Handler>) -> Self {
        Self { inner }
    }
}

impl Handler for CloudLoggingHandler {
    fn enabled(&self, ctx: &Context, level: Level) -> bool {
        self.inner.enabled(ctx, level)
    }

    fn handle(&self, ctx: &Context, record: &Record) -> Result<(), LogError> {
        let record = match ctx.trace() {
            Some(trace) => {
                let mut rec = record.clone();
                rec.add(Attr::new(TRACE_KEY, trace.as_str()));
                Cow::Owned(rec)
            }
            None => Cow::Borrowed(record),
        };
        self.inner.handle(ctx, &record)
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        Arc::new(Self::wrap(self.inner.with_attrs(attrs)))
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        Arc::new(Self::wrap(self.inner.with_group(name)))
    }
}
