//! Event model and builders
//!
//! An [`Event`] is the unit of reporting: one exception or one message,
//! stamped with an id, a capture timestamp, and the client's environment and
//! service name. Events are built once, never mutated, and read only by the
//! transport worker when it serializes them for delivery.
//!
//! The serialized form matches the collector's ingestion schema:
//!
//! ```json
//! {
//!   "event_id": "…", "timestamp": 1724800000,
//!   "environment": "production", "service_name": "default-service",
//!   "sdk": {"name": "faultline-rust", "version": "0.1.0"},
//!   "type": "exception",
//!   "exception": {"type": "ParseError", "message": "…", "stacktrace": ["…"]},
//!   "tags": {}, "extra": {}
//! }
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::PanicHookInfo;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

/// SDK identifier reported with every event.
pub const SDK_NAME: &str = "faultline-rust";

/// String-to-string labels attached to an event.
pub type Tags = BTreeMap<String, String>;

/// Arbitrary JSON-valued metadata attached to an event.
pub type Extra = BTreeMap<String, serde_json::Value>;

/// Severity names the collector documents for message events.
///
/// The `level` field is deliberately free-form; these constants are a
/// convenience, not a validation surface.
pub mod level {
    pub const DEBUG: &str = "debug";
    pub const INFO: &str = "info";
    pub const WARNING: &str = "warning";
    pub const ERROR: &str = "error";
}

/// SDK name/version tag
#[derive(Debug, Clone, Serialize)]
pub struct Sdk {
    pub name: &'static str,
    pub version: &'static str,
}

impl Default for Sdk {
    fn default() -> Self {
        Sdk {
            name: SDK_NAME,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Exception details carried by an exception event
#[derive(Debug, Clone, Serialize)]
pub struct ExceptionPayload {
    /// Name of the error type, `null` when unknown
    #[serde(rename = "type")]
    pub exception_type: Option<String>,
    /// String form of the error value
    pub message: String,
    /// Formatted frames, oldest call first; empty when no trace is available
    pub stacktrace: Vec<String>,
}

/// Message details carried by a message event
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    pub text: String,
    pub level: String,
}

/// Kind-specific payload of an event
///
/// Serializes as a `"type"` discriminator plus a same-named payload object,
/// per the ingestion schema.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventKind {
    Exception { exception: ExceptionPayload },
    Message { message: MessagePayload },
}

/// Environment and service identity copied onto every event a client builds.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub environment: String,
    pub service_name: String,
}

/// One immutable exception- or message-report record
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Process-unique random identifier, generated at build time
    pub event_id: String,
    /// Capture time, seconds since epoch
    pub timestamp: i64,
    pub environment: String,
    pub service_name: String,
    pub sdk: Sdk,
    #[serde(flatten)]
    pub kind: EventKind,
    pub tags: Tags,
    pub extra: Extra,
}

impl Event {
    /// Build an exception event.
    pub fn exception(
        ctx: &EventContext,
        info: ExceptionInfo,
        tags: Option<Tags>,
        extra: Option<Extra>,
    ) -> Self {
        Self::build(
            ctx,
            EventKind::Exception {
                exception: ExceptionPayload {
                    exception_type: info.type_name,
                    message: info.message,
                    stacktrace: info.stacktrace,
                },
            },
            tags,
            extra,
        )
    }

    /// Build a message event. `level` is passed through verbatim.
    pub fn message(
        ctx: &EventContext,
        text: &str,
        level: &str,
        tags: Option<Tags>,
        extra: Option<Extra>,
    ) -> Self {
        Self::build(
            ctx,
            EventKind::Message {
                message: MessagePayload {
                    text: text.to_string(),
                    level: level.to_string(),
                },
            },
            tags,
            extra,
        )
    }

    fn build(ctx: &EventContext, kind: EventKind, tags: Option<Tags>, extra: Option<Extra>) -> Self {
        Event {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp(),
            environment: ctx.environment.clone(),
            service_name: ctx.service_name.clone(),
            sdk: Sdk::default(),
            kind,
            tags: tags.unwrap_or_default(),
            extra: extra.unwrap_or_default(),
        }
    }
}

/// Captured exception details, independent of any client
///
/// This is the explicit `(type, value, trace)` form of capture: build one
/// from a live error or panic, or construct it by hand when the exception
/// originated elsewhere (e.g. was deserialized from another process).
#[derive(Debug, Clone)]
pub struct ExceptionInfo {
    /// Error type name; `None` when the type is unknown
    pub type_name: Option<String>,
    /// String form of the error value
    pub message: String,
    /// Formatted frames, oldest call first
    pub stacktrace: Vec<String>,
}

impl ExceptionInfo {
    /// Capture a live error value together with the current call stack.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        ExceptionInfo {
            type_name: Some(short_type_name(std::any::type_name::<E>()).to_string()),
            message: err.to_string(),
            stacktrace: capture_stacktrace(),
        }
    }

    /// Capture panic details from inside a panic hook.
    ///
    /// The panic location becomes the first stack line, followed by the live
    /// call stack (the hook runs on the panicking thread, before unwinding).
    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let mut stacktrace = Vec::new();
        if let Some(location) = info.location() {
            stacktrace.push(format!(
                "panicked at {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            ));
        }
        stacktrace.extend(capture_stacktrace());
        Self::panic(payload_message(info.payload()), stacktrace)
    }

    /// Build panic details from an already-extracted message and trace.
    pub(crate) fn panic(message: String, stacktrace: Vec<String>) -> Self {
        ExceptionInfo {
            type_name: Some("panic".to_string()),
            message,
            stacktrace,
        }
    }
}

/// Render a panic payload as a message string.
pub(crate) fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Capture the current call stack as formatted frames, oldest call first.
///
/// Frames that cannot be symbolized still appear (as `<unknown>`); a fully
/// unavailable backtrace yields an empty vector, never an error.
pub(crate) fn capture_stacktrace() -> Vec<String> {
    let bt = backtrace::Backtrace::new();
    let mut frames = Vec::new();
    for frame in bt.frames() {
        for symbol in frame.symbols() {
            let name = symbol
                .name()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            let line = match (symbol.filename(), symbol.lineno()) {
                (Some(file), Some(lineno)) => {
                    format!("{} at {}:{}", name, file.display(), lineno)
                }
                _ => name,
            };
            frames.push(line);
        }
    }
    // Innermost-first as captured; the wire format wants call order.
    frames.reverse();
    frames
}

/// Strip the module path off a fully qualified type name.
///
/// Generic arguments carry their own `::` paths, so the name is truncated
/// at the first `<` before the path is stripped.
fn short_type_name(full: &'static str) -> &'static str {
    let base = match full.find('<') {
        Some(idx) => &full[..idx],
        None => full,
    };
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    fn test_ctx() -> EventContext {
        EventContext {
            environment: "test".to_string(),
            service_name: "svc".to_string(),
        }
    }

    #[derive(Debug)]
    struct ValueError(String);

    impl fmt::Display for ValueError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for ValueError {}

    #[test]
    fn test_exception_event_fields() {
        let info = ExceptionInfo {
            type_name: Some("ValueError".to_string()),
            message: "boom".to_string(),
            stacktrace: Vec::new(),
        };
        let event = Event::exception(&test_ctx(), info, None, None);

        assert!(!event.event_id.is_empty());
        assert!(event.timestamp > 0);
        assert_eq!(event.environment, "test");
        assert_eq!(event.service_name, "svc");
        assert!(event.tags.is_empty());
        assert!(event.extra.is_empty());

        match &event.kind {
            EventKind::Exception { exception } => {
                assert_eq!(exception.exception_type.as_deref(), Some("ValueError"));
                assert_eq!(exception.message, "boom");
                assert!(exception.stacktrace.is_empty());
            }
            EventKind::Message { .. } => panic!("expected exception kind"),
        }
    }

    #[test]
    fn test_message_event_fields() {
        let event = Event::message(&test_ctx(), "hi", level::WARNING, None, None);
        match &event.kind {
            EventKind::Message { message } => {
                assert_eq!(message.text, "hi");
                assert_eq!(message.level, "warning");
            }
            EventKind::Exception { .. } => panic!("expected message kind"),
        }
    }

    #[test]
    fn test_level_is_free_form() {
        let event = Event::message(&test_ctx(), "hi", "catastrophic", None, None);
        match &event.kind {
            EventKind::Message { message } => assert_eq!(message.level, "catastrophic"),
            EventKind::Exception { .. } => panic!("expected message kind"),
        }
    }

    #[test]
    fn test_exception_wire_format() {
        let info = ExceptionInfo {
            type_name: None,
            message: "boom".to_string(),
            stacktrace: vec!["frame one".to_string(), "frame two".to_string()],
        };
        let event = Event::exception(&test_ctx(), info, None, None);
        let value = serde_json::to_value(&event).expect("event serializes");

        assert_eq!(value["type"], "exception");
        // Unknown type is null, not absent.
        assert!(value["exception"]["type"].is_null());
        assert_eq!(value["exception"]["message"], "boom");
        assert_eq!(
            value["exception"]["stacktrace"],
            serde_json::json!(["frame one", "frame two"])
        );
        assert_eq!(value["sdk"]["name"], SDK_NAME);
        assert_eq!(value["sdk"]["version"], env!("CARGO_PKG_VERSION"));
        assert!(value["timestamp"].is_i64());
        assert_eq!(value["tags"], serde_json::json!({}));
        assert_eq!(value["extra"], serde_json::json!({}));
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_message_wire_format() {
        let mut tags = Tags::new();
        tags.insert("region".to_string(), "eu-west-1".to_string());
        let mut extra = Extra::new();
        extra.insert("attempt".to_string(), serde_json::json!(3));

        let event = Event::message(&test_ctx(), "hi", level::INFO, Some(tags), Some(extra));
        let value = serde_json::to_value(&event).expect("event serializes");

        assert_eq!(value["type"], "message");
        assert_eq!(
            value["message"],
            serde_json::json!({"text": "hi", "level": "info"})
        );
        assert!(value.get("exception").is_none());
        assert_eq!(value["tags"]["region"], "eu-west-1");
        assert_eq!(value["extra"]["attempt"], 3);
    }

    #[test]
    fn test_from_error_names_the_type() {
        let err = ValueError("boom".to_string());
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.type_name.as_deref(), Some("ValueError"));
        assert_eq!(info.message, "boom");
    }

    #[derive(Debug)]
    struct WrapError<T: fmt::Debug>(T);

    impl<T: fmt::Debug> fmt::Display for WrapError<T> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    impl<T: fmt::Debug> std::error::Error for WrapError<T> {}

    #[test]
    fn test_from_error_names_generic_types_cleanly() {
        // The generic argument's own module path must not leak into the
        // reported type name.
        let err = WrapError(String::from("boom"));
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.type_name.as_deref(), Some("WrapError"));
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = Event::message(&test_ctx(), "x", level::INFO, None, None);
        let b = Event::message(&test_ctx(), "x", level::INFO, None, None);
        assert_ne!(a.event_id, b.event_id);
    }

    #[test]
    fn test_payload_message_forms() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(payload_message(s.as_ref()), "static str");
        let s: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(payload_message(s.as_ref()), "owned");
        let s: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(payload_message(s.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("crate::module::ValueError"), "ValueError");
        assert_eq!(short_type_name("Bare"), "Bare");
        assert_eq!(
            short_type_name("crate::module::WrapError<alloc::string::String>"),
            "WrapError"
        );
        assert_eq!(short_type_name("Pair<u8, alloc::string::String>"), "Pair");
    }

    #[test]
    fn test_tags_serialize_in_key_order() {
        let mut tags = Tags::new();
        tags.insert("zone".to_string(), "b".to_string());
        tags.insert("app".to_string(), "a".to_string());
        let event = Event::message(&test_ctx(), "hi", level::INFO, Some(tags), None);
        let rendered = serde_json::to_string(&event).expect("event serializes");
        let app = rendered.find("\"app\"").expect("app tag present");
        let zone = rendered.find("\"zone\"").expect("zone tag present");
        assert!(app < zone);
    }
}
