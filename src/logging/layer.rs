//! Bridge from `tracing` events to a [`Handler`].
//!
//! Installed as a `tracing_subscriber` layer so that every `tracing` macro in
//! the process (ours, tower-http's, axum's) goes through the same Cloud
//! Logging handler as [`Logger`](crate::logging::Logger) calls, and picks up
//! the current request's trace from [`Context::current`].

use std::fmt;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{span, Event, Subscriber};
use tracing_subscriber::layer::{Context as LayerContext, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::logging::handler::Handler;
use crate::logging::record::{Attr, Level, Record, Source, Value};
use crate::trace::Context;

/// Fields recorded on a span, attached to every event inside it.
struct SpanFields(Vec<Attr>);

impl SpanFields {
    fn merge(&mut self, attrs: Vec<Attr>) {
        for attr in attrs {
            match self.0.iter_mut().find(|a| a.key == attr.key) {
                Some(existing) => existing.value = attr.value,
                None => self.0.push(attr),
            }
        }
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    attrs: Vec<Attr>,
}

impl FieldVisitor {
    fn push(&mut self, field: &Field, value: impl Into<Value>) {
        self.attrs.push(Attr::new(field.name(), value));
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.push(field, value);
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.push(field, text);
        }
    }
}

/// `tracing_subscriber` layer writing events through a [`Handler`].
pub struct CloudLoggingLayer {
    handler: Arc<dyn Handler>,
}

impl CloudLoggingLayer {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }
}

impl<S> Layer<S> for CloudLoggingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: LayerContext<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);
        span.extensions_mut().insert(SpanFields(visitor.attrs));
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: LayerContext<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFields>() {
            Some(fields) => fields.merge(visitor.attrs),
            None => extensions.insert(SpanFields(visitor.attrs)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: LayerContext<'_, S>) {
        let metadata = event.metadata();
        let level = Level::from(*metadata.level());
        let context = Context::current();
        if !self.handler.enabled(&context, level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Record::new(level, visitor.message.unwrap_or_default());
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            let mut source = Source::new(file, line);
            if let Some(module) = metadata.module_path() {
                source = source.with_function(module);
            }
            record = record.with_source(source);
        }

        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(fields) = span.extensions().get::<SpanFields>() {
                    record.add_attrs(fields.0.iter().cloned());
                }
            }
        }
        record.add_attrs(visitor.attrs);

        // Layers cannot report errors; a failed write is dropped like the fmt layer does.
        let _ = self.handler.handle(&context, &record);
    }
}
