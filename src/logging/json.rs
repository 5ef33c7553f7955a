//! Newline-delimited JSON log backend.
//!
//! # Output
//! ```text
//! {"time":"...","level":"INFO","source":{...},"msg":"...", <handler attrs>, <record attrs>}\n
//! ```
//!
//! # Design Decisions
//! - One `write_all` per record while holding the writer lock, so concurrent
//!   records never interleave
//! - Attributes added through `with_attrs` are rendered once, up front
//! - Key renaming is a hook (`replace_attr`), not a property of this backend
//! - Built-in keys always win: an attribute whose top-level key is already
//!   taken by a built-in is written under [`DUPLICATE_PREFIX`] + key. The
//!   same applies when a group and a plain value share a key

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::SecondsFormat;
use serde_json::{Map, Value as JsonValue};

use crate::logging::handler::{Handler, LogError};
use crate::logging::record::{Attr, Level, Record, Value};
use crate::trace::Context;

pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const SOURCE_KEY: &str = "source";
pub const MESSAGE_KEY: &str = "msg";

/// Prefix given to an attribute key that is already taken in its object.
pub const DUPLICATE_PREFIX: &str = "attr.";

/// Rewrites an attribute before it is serialized. Receives the open group
/// path (empty for built-in keys). Returning an attribute with an empty key
/// drops it.
pub type ReplaceAttr = Arc<dyn Fn(&[String], Attr) -> Attr + Send + Sync>;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Options for [`JsonHandler`].
#[derive(Clone)]
pub struct HandlerOptions {
    /// Include the `source` key when the record carries a location.
    pub add_source: bool,

    /// Minimum level emitted.
    pub level: Level,

    pub replace_attr: Option<ReplaceAttr>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            add_source: false,
            level: Level::INFO,
            replace_attr: None,
        }
    }
}

/// Handler that writes each record as one JSON object per line.
#[derive(Clone)]
pub struct JsonHandler {
    writer: SharedWriter,
    options: Arc<HandlerOptions>,
    groups: Vec<String>,
    preformatted: Map<String, JsonValue>,
}

impl JsonHandler {
    pub fn new<W>(writer: W, options: HandlerOptions) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
            options: Arc::new(options),
            groups: Vec::new(),
            preformatted: Map::new(),
        }
    }

    fn replace(&self) -> Option<&ReplaceAttr> {
        self.options.replace_attr.as_ref()
    }

    fn format(&self, record: &Record) -> Map<String, JsonValue> {
        let mut out = Map::new();

        let mut builtins = vec![
            Attr::new(TIME_KEY, record.time),
            Attr::new(LEVEL_KEY, record.level),
        ];
        if self.options.add_source {
            if let Some(source) = &record.source {
                builtins.push(Attr::new(SOURCE_KEY, source.clone()));
            }
        }
        builtins.push(Attr::new(MESSAGE_KEY, record.message.as_str()));

        for attr in builtins {
            render_attr(&mut out, &[], attr, self.replace());
        }

        let mut attrs = self.preformatted.clone();
        for attr in &record.attrs {
            render_attr(&mut attrs, &self.groups, attr.clone(), self.replace());
        }

        for (key, value) in attrs {
            let key = if out.contains_key(&key) {
                format!("{}{}", DUPLICATE_PREFIX, key)
            } else {
                key
            };
            out.insert(key, value);
        }
        out
    }

    fn write_line(&self, out: &Map<String, JsonValue>) -> Result<(), LogError> {
        let mut line = serde_json::to_vec(out)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}

impl Handler for JsonHandler {
    fn enabled(&self, _ctx: &Context, level: Level) -> bool {
        level >= self.options.level
    }

    fn handle(&self, _ctx: &Context, record: &Record) -> Result<(), LogError> {
        let out = self.format(record);
        self.write_line(&out)
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Arc<dyn Handler> {
        let mut next = self.clone();
        for attr in attrs {
            render_attr(&mut next.preformatted, &self.groups, attr, self.replace());
        }
        Arc::new(next)
    }

    fn with_group(&self, name: &str) -> Arc<dyn Handler> {
        let mut next = self.clone();
        if !name.is_empty() {
            next.groups.push(name.to_string());
        }
        Arc::new(next)
    }
}

fn render_attr(
    out: &mut Map<String, JsonValue>,
    groups: &[String],
    attr: Attr,
    replace: Option<&ReplaceAttr>,
) {
    if let Value::Group(members) = attr.value {
        if members.is_empty() {
            return;
        }
        let mut path = groups.to_vec();
        if !attr.key.is_empty() {
            path.push(attr.key);
        }
        for member in members {
            render_attr(out, &path, member, replace);
        }
        return;
    }

    let attr = match replace {
        Some(f) => f(groups, attr),
        None => attr,
    };
    if attr.key.is_empty() {
        return;
    }
    if matches!(attr.value, Value::Group(_)) {
        render_attr(out, groups, attr, None);
        return;
    }

    insert_at(out, groups, attr.key, to_json(&attr.value));
}

fn insert_at(out: &mut Map<String, JsonValue>, path: &[String], key: String, value: JsonValue) {
    let mut target = out;
    for name in path {
        let name = match target.get(name) {
            Some(existing) if !existing.is_object() => format!("{}{}", DUPLICATE_PREFIX, name),
            _ => name.clone(),
        };
        let slot = target
            .entry(name)
            .or_insert_with(|| JsonValue::Object(Map::new()));
        target = match slot.as_object_mut() {
            Some(map) => map,
            None => return,
        };
    }

    // A plain value never replaces a group.
    let key = match target.get(&key) {
        Some(existing) if existing.is_object() && !value.is_object() => {
            format!("{}{}", DUPLICATE_PREFIX, key)
        }
        _ => key,
    };
    target.insert(key, value);
}

fn to_json(value: &Value) -> JsonValue {
    match value {
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Int(i) => JsonValue::from(*i),
        Value::Uint(u) => JsonValue::from(*u),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Time(t) => JsonValue::String(t.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        Value::Level(level) => JsonValue::String(level.to_string()),
        Value::Source(source) => {
            let mut map = Map::new();
            if let Some(function) = &source.function {
                map.insert("function".into(), JsonValue::String(function.clone()));
            }
            map.insert("file".into(), JsonValue::String(source.file.clone()));
            map.insert("line".into(), JsonValue::from(source.line));
            JsonValue::Object(map)
        }
        Value::Group(attrs) => {
            let mut map = Map::new();
            for attr in attrs {
                render_attr(&mut map, &[], attr.clone(), None);
            }
            JsonValue::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::record::Source;
    use crate::logging::test_support::{Buffer, FailingWriter};
    use serde_json::json;

    fn handler(buf: &Buffer, options: HandlerOptions) -> JsonHandler {
        JsonHandler::new(buf.clone(), options)
    }

    fn debug_options() -> HandlerOptions {
        HandlerOptions {
            level: Level::DEBUG,
            ..Default::default()
        }
    }

    #[test]
    fn writes_builtins_and_attrs() {
        let buf = Buffer::new();
        let h = handler(&buf, debug_options());

        let mut rec = Record::new(Level::INFO, "hello");
        rec.add(Attr::new("count", 42));
        rec.add(Attr::new("name", "value"));
        h.handle(&Context::background(), &rec).unwrap();

        let lines = buf.lines();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["msg"], "hello");
        assert_eq!(line["count"], 42);
        assert_eq!(line["name"], "value");
        assert!(line["time"].as_str().unwrap().ends_with('Z'));
        assert!(line.get("source").is_none());

        let keys: Vec<_> = line.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["time", "level", "msg", "count", "name"]);
    }

    #[test]
    fn source_only_when_enabled() {
        let buf = Buffer::new();
        let h = handler(
            &buf,
            HandlerOptions {
                add_source: true,
                ..debug_options()
            },
        );

        let rec = Record::new(Level::WARN, "with source")
            .with_source(Source::new("src/main.rs", 10).with_function("app::run"));
        h.handle(&Context::background(), &rec).unwrap();
        h.handle(&Context::background(), &Record::new(Level::WARN, "no source")).unwrap();

        let lines = buf.lines();
        assert_eq!(
            lines[0]["source"],
            json!({"function": "app::run", "file": "src/main.rs", "line": 10})
        );
        assert!(lines[1].get("source").is_none());
    }

    #[test]
    fn enabled_respects_minimum_level() {
        let h = handler(&Buffer::new(), HandlerOptions::default());
        let ctx = Context::background();
        assert!(!h.enabled(&ctx, Level::DEBUG));
        assert!(h.enabled(&ctx, Level::INFO));
        assert!(h.enabled(&ctx, Level::new(12)));
    }

    #[test]
    fn with_attrs_and_groups_nest() {
        let buf = Buffer::new();
        let h = handler(&buf, debug_options());
        let h = h.with_attrs(vec![Attr::new("service", "api")]);
        let h = h.with_group("req");
        let h = h.with_attrs(vec![Attr::new("method", "GET")]);

        let mut rec = Record::new(Level::INFO, "grouped");
        rec.add(Attr::new("status", 200));
        h.handle(&Context::background(), &rec).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["service"], "api");
        assert_eq!(line["req"], json!({"method": "GET", "status": 200}));
    }

    #[test]
    fn empty_groups_are_omitted() {
        let buf = Buffer::new();
        let h = handler(&buf, debug_options()).with_group("unused");
        let mut rec = Record::new(Level::INFO, "no attrs");
        rec.add(Attr::group("empty", Vec::new()));
        h.handle(&Context::background(), &rec).unwrap();

        let line = &buf.lines()[0];
        assert!(line.get("unused").is_none());
        assert!(line.get("empty").is_none());
    }

    #[test]
    fn inline_group_with_empty_key() {
        let buf = Buffer::new();
        let h = handler(&buf, debug_options());
        let mut rec = Record::new(Level::INFO, "inline");
        rec.add(Attr::group("", [Attr::new("a", 1), Attr::new("b", 2)]));
        rec.add(Attr::group("g", [Attr::new("c", 3)]));
        h.handle(&Context::background(), &rec).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["a"], 1);
        assert_eq!(line["b"], 2);
        assert_eq!(line["g"], json!({"c": 3}));
    }

    #[test]
    fn replace_attr_sees_groups_and_can_drop() {
        let buf = Buffer::new();
        let replace: ReplaceAttr = Arc::new(|groups: &[String], mut attr: Attr| {
            if attr.key == "secret" {
                attr.key.clear();
            } else if !groups.is_empty() {
                attr.key = format!("{}.{}", groups.join("."), attr.key);
            }
            attr
        });
        let h = handler(
            &buf,
            HandlerOptions {
                replace_attr: Some(replace),
                ..debug_options()
            },
        )
        .with_group("outer");

        let mut rec = Record::new(Level::INFO, "replace");
        rec.add(Attr::new("secret", "hunter2"));
        rec.add(Attr::new("kept", true));
        h.handle(&Context::background(), &rec).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["msg"], "replace");
        assert_eq!(line["outer"], json!({"outer.kept": true}));
        assert!(!line.to_string().contains("hunter2"));
    }

    #[test]
    fn attrs_never_replace_builtins() {
        let buf = Buffer::new();
        let h = handler(&buf, debug_options()).with_attrs(vec![Attr::new("time", "yesterday")]);
        let mut rec = Record::new(Level::INFO, "real");
        rec.add(Attr::new("msg", "user"));
        rec.add(Attr::group("level", [Attr::new("n", 1)]));
        h.handle(&Context::background(), &rec).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["msg"], "real");
        assert_eq!(line["level"], "INFO");
        assert!(line["time"].as_str().unwrap().ends_with('Z'));
        assert_eq!(line["attr.msg"], "user");
        assert_eq!(line["attr.time"], "yesterday");
        assert_eq!(line["attr.level"], json!({"n": 1}));
    }

    #[test]
    fn groups_and_values_sharing_a_key_both_survive() {
        let buf = Buffer::new();
        let h = handler(&buf, debug_options());
        let mut rec = Record::new(Level::INFO, "shared keys");
        rec.add(Attr::new("req", "plain"));
        rec.add(Attr::group("req", [Attr::new("status", 200)]));
        rec.add(Attr::group("resp", [Attr::new("bytes", 10)]));
        rec.add(Attr::new("resp", "plain"));
        h.handle(&Context::background(), &rec).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["req"], "plain");
        assert_eq!(line["attr.req"], json!({"status": 200}));
        assert_eq!(line["resp"], json!({"bytes": 10}));
        assert_eq!(line["attr.resp"], "plain");
    }

    #[test]
    fn non_finite_floats_become_strings() {
        let buf = Buffer::new();
        let h = handler(&buf, debug_options());
        let mut rec = Record::new(Level::INFO, "floats");
        rec.add(Attr::new("ratio", 0.5));
        rec.add(Attr::new("nan", f64::NAN));
        h.handle(&Context::background(), &rec).unwrap();

        let line = &buf.lines()[0];
        assert_eq!(line["ratio"], 0.5);
        assert_eq!(line["nan"], "NaN");
    }

    #[test]
    fn write_errors_propagate() {
        let h = JsonHandler::new(FailingWriter, debug_options());
        let err = h
            .handle(&Context::background(), &Record::new(Level::INFO, "lost"))
            .unwrap_err();
        assert!(matches!(err, LogError::Io(_)));
    }
}
