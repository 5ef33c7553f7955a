//! Logger front-end over a [`Handler`].

use std::panic::Location;
use std::sync::Arc;

use crate::logging::cloud::LEVEL_CRITICAL;
use crate::logging::handler::{Handler, LogError};
use crate::logging::record::{Attr, Level, Record, Source};
use crate::trace::Context;

/// Cheaply cloneable handle for emitting records.
///
/// Every call takes the request [`Context`] explicitly; inside a request
/// handler it comes from the `Context` extractor, elsewhere
/// [`Context::current`] or [`Context::background`].
#[derive(Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
}

impl Logger {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// A logger whose records all carry `attrs`.
    pub fn with(&self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        Self::new(self.handler.with_attrs(attrs.into_iter().collect()))
    }

    pub fn with_group(&self, name: &str) -> Self {
        Self::new(self.handler.with_group(name))
    }

    pub fn enabled(&self, ctx: &Context, level: Level) -> bool {
        self.handler.enabled(ctx, level)
    }

    /// Emit a record at `level`, sourced at the caller's location.
    #[track_caller]
    pub fn log(
        &self,
        ctx: &Context,
        level: Level,
        msg: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), LogError> {
        if !self.enabled(ctx, level) {
            return Ok(());
        }

        let caller = Location::caller();
        let mut record =
            Record::new(level, msg).with_source(Source::new(caller.file(), caller.line()));
        record.add_attrs(attrs);
        self.handler.handle(ctx, &record)
    }

    #[track_caller]
    pub fn debug(
        &self,
        ctx: &Context,
        msg: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), LogError> {
        self.log(ctx, Level::DEBUG, msg, attrs)
    }

    #[track_caller]
    pub fn info(
        &self,
        ctx: &Context,
        msg: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), LogError> {
        self.log(ctx, Level::INFO, msg, attrs)
    }

    #[track_caller]
    pub fn warn(
        &self,
        ctx: &Context,
        msg: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), LogError> {
        self.log(ctx, Level::WARN, msg, attrs)
    }

    #[track_caller]
    pub fn error(
        &self,
        ctx: &Context,
        msg: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), LogError> {
        self.log(ctx, Level::ERROR, msg, attrs)
    }

    #[track_caller]
    pub fn critical(
        &self,
        ctx: &Context,
        msg: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), LogError> {
        self.log(ctx, LEVEL_CRITICAL, msg, attrs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::cloud::{self, CloudLoggingHandler, SOURCE_LOCATION_KEY, TRACE_KEY};
    use crate::logging::test_support::{Buffer, FailingWriter};
    use crate::trace::{CloudTrace, ProjectId};

    fn logger(buf: &Buffer, level: Level) -> Logger {
        Logger::new(Arc::new(CloudLoggingHandler::new(buf.clone(), cloud::options(level))))
    }

    #[test]
    fn records_caller_location() {
        let buf = Buffer::new();
        let log = logger(&buf, Level::DEBUG);
        let line_no = line!() + 1;
        log.info(&Context::background(), "located", []).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line[SOURCE_LOCATION_KEY]["file"], file!());
        assert_eq!(line[SOURCE_LOCATION_KEY]["line"], line_no);
    }

    #[test]
    fn skips_disabled_levels() {
        let buf = Buffer::new();
        let log = logger(&buf, Level::INFO);
        log.debug(&Context::background(), "quiet", []).unwrap();
        log.warn(&Context::background(), "loud", []).unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], "loud");
    }

    #[test]
    fn critical_severity() {
        let buf = Buffer::new();
        logger(&buf, Level::DEBUG)
            .critical(&Context::background(), "down", [Attr::new("code", 7)])
            .unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["severity"], "CRITICAL");
        assert_eq!(line["code"], 7);
    }

    #[test]
    fn with_attrs_and_trace() {
        let buf = Buffer::new();
        let log = logger(&buf, Level::DEBUG).with([Attr::new("component", "worker")]);
        let ctx = Context::with_trace(Some(CloudTrace::new(&ProjectId::new("myproj"), "abc123")));
        log.error(&ctx, "failed", [Attr::new("retry", false)]).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["component"], "worker");
        assert_eq!(line["retry"], false);
        assert_eq!(line["severity"], "ERROR");
        assert_eq!(line[TRACE_KEY], "projects/myproj/traces/abc123");
    }

    #[test]
    fn grouped_logger() {
        let buf = Buffer::new();
        let log = logger(&buf, Level::DEBUG).with_group("http");
        log.info(&Context::background(), "req", [Attr::new("status", 200)]).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["http"]["status"], 200);
        assert_eq!(line["message"], "req");
    }

    #[test]
    fn write_failure_reaches_caller() {
        let log = Logger::new(Arc::new(CloudLoggingHandler::new(
            FailingWriter,
            cloud::options(Level::DEBUG),
        )));
        assert!(log.info(&Context::background(), "lost", []).is_err());
    }
}
