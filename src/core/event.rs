//! Log event record and event assembly
//!
//! `LogEvent` is the wire shape handed to transports. It is assembled once
//! per admitted call and never mutated after it enters the batch queue.

use crate::core::config::{Env, Identity};
use crate::core::level::Level;
use crate::core::sanitize::sanitize_ctx;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};

/// Caller-supplied context map
pub type Ctx = serde_json::Map<String, Value>;

/// Reserved context key promoted to the top-level `component` field
pub const CTX_COMPONENT_KEY: &str = "component";
/// Reserved context key promoted to the top-level `traceId` field
pub const CTX_TRACE_ID_KEY: &str = "traceId";

/// Normalized error descriptor attached to error events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<ErrorCode>,
}

/// Error codes may be symbolic or numeric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Text(String),
    Numeric(i64),
}

impl From<&str> for ErrorCode {
    fn from(s: &str) -> Self {
        ErrorCode::Text(s.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(s: String) -> Self {
        ErrorCode::Text(s)
    }
}

impl From<i64> for ErrorCode {
    fn from(n: i64) -> Self {
        ErrorCode::Numeric(n)
    }
}

impl From<i32> for ErrorCode {
    fn from(n: i32) -> Self {
        ErrorCode::Numeric(i64::from(n))
    }
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            name: None,
            code: None,
        }
    }

    /// Normalize any error value into the wire descriptor.
    ///
    /// `message` comes from `Display`, `name` from the concrete type, and
    /// `stack` from the runtime backtrace when one is being captured
    /// (`RUST_BACKTRACE=1`).
    pub fn from_error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let backtrace = Backtrace::capture();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };
        Self {
            message: err.to_string(),
            stack,
            name: Some(short_type_name::<E>()),
            code: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<ErrorCode>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Last path segment of a type name, generics stripped
fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// The wire/record shape delivered to transports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Milliseconds since epoch, assigned at build time
    pub ts: i64,
    pub lvl: Level,
    pub app: String,
    pub env: Env,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub component: Option<String>,
    pub event: String,
    #[serde(skip_serializing_if = "Ctx::is_empty", default)]
    pub ctx: Ctx,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub err: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub trace_id: Option<String>,
    pub session_id: String,
}

/// Reserved fields pulled out of the raw context before sanitization
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Hoisted {
    pub component: Option<String>,
    pub trace_id: Option<String>,
}

/// Remove `component`/`traceId` from the map when string-valued.
///
/// Non-string values under the reserved keys stay in the context untouched.
pub(crate) fn hoist_reserved(ctx: &mut Ctx) -> Hoisted {
    Hoisted {
        component: take_string(ctx, CTX_COMPONENT_KEY),
        trace_id: take_string(ctx, CTX_TRACE_ID_KEY),
    }
}

fn take_string(ctx: &mut Ctx, key: &str) -> Option<String> {
    if matches!(ctx.get(key), Some(Value::String(_))) {
        if let Some(Value::String(s)) = ctx.remove(key) {
            return Some(s);
        }
    }
    None
}

/// Inputs to one event assembly
pub(crate) struct EventParts<'a> {
    pub identity: &'a Identity,
    pub session_id: &'a str,
    pub ts: i64,
    pub lvl: Level,
    pub event: &'a str,
    /// Component path seeded by a child-logger view
    pub component: Option<&'a str>,
    /// Fixed extra context seeded by a child-logger view
    pub extra: Option<&'a Ctx>,
    pub ctx: Option<Ctx>,
    pub default_ctx: &'a Ctx,
    pub err: Option<ErrorInfo>,
}

/// Build one event: seed, hoist, merge defaults underneath, sanitize.
///
/// The raw map is `{component: seed} ∪ extra ∪ ctx` with later entries
/// winning, so a call-supplied string `component` overrides the view's.
/// Hoisting runs on that raw map only; reserved keys inside `default_ctx`
/// are ordinary context.
pub(crate) fn assemble(parts: EventParts<'_>) -> LogEvent {
    let mut raw = Ctx::new();
    if let Some(seed) = parts.component {
        raw.insert(
            CTX_COMPONENT_KEY.to_string(),
            Value::String(seed.to_string()),
        );
    }
    if let Some(extra) = parts.extra {
        for (key, value) in extra {
            raw.insert(key.clone(), value.clone());
        }
    }
    if let Some(call_ctx) = parts.ctx {
        for (key, value) in call_ctx {
            raw.insert(key, value);
        }
    }

    let hoisted = hoist_reserved(&mut raw);

    let mut merged = parts.default_ctx.clone();
    for (key, value) in raw {
        merged.insert(key, value);
    }

    LogEvent {
        ts: parts.ts,
        lvl: parts.lvl,
        app: parts.identity.app.clone(),
        env: parts.identity.env,
        ver: parts.identity.ver.clone(),
        component: hoisted.component,
        event: parts.event.to_string(),
        ctx: sanitize_ctx(merged),
        err: parts.err,
        trace_id: hoisted.trace_id,
        session_id: parts.session_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> Identity {
        Identity {
            app: "shop".to_string(),
            env: Env::Test,
            ver: Some("1.2.3".to_string()),
        }
    }

    fn parts<'a>(
        identity: &'a Identity,
        default_ctx: &'a Ctx,
        ctx: Option<Ctx>,
    ) -> EventParts<'a> {
        EventParts {
            identity,
            session_id: "s-1",
            ts: 1_700_000_000_000,
            lvl: Level::Info,
            event: "user.login",
            component: None,
            extra: None,
            ctx,
            default_ctx,
            err: None,
        }
    }

    #[test]
    fn test_hoist_string_reserved_keys() {
        let mut ctx = Ctx::new();
        ctx.insert("component".to_string(), json!("auth"));
        ctx.insert("traceId".to_string(), json!("t-123"));
        ctx.insert("k".to_string(), json!("v"));

        let hoisted = hoist_reserved(&mut ctx);
        assert_eq!(hoisted.component.as_deref(), Some("auth"));
        assert_eq!(hoisted.trace_id.as_deref(), Some("t-123"));
        assert!(!ctx.contains_key("component"));
        assert!(!ctx.contains_key("traceId"));
        assert!(ctx.contains_key("k"));
    }

    #[test]
    fn test_non_string_reserved_keys_stay_in_ctx() {
        let mut ctx = Ctx::new();
        ctx.insert("component".to_string(), json!(7));
        ctx.insert("traceId".to_string(), json!({"nested": true}));

        let hoisted = hoist_reserved(&mut ctx);
        assert_eq!(hoisted, Hoisted::default());
        assert_eq!(ctx["component"], json!(7));
    }

    #[test]
    fn test_call_ctx_wins_over_default_ctx() {
        let identity = identity();
        let mut default_ctx = Ctx::new();
        default_ctx.insert("region".to_string(), json!("us"));
        default_ctx.insert("build".to_string(), json!("dev"));
        let mut call = Ctx::new();
        call.insert("region".to_string(), json!("eu"));

        let ev = assemble(parts(&identity, &default_ctx, Some(call)));
        assert_eq!(ev.ctx["region"], json!("eu"));
        assert_eq!(ev.ctx["build"], json!("dev"));
    }

    #[test]
    fn test_call_ctx_component_overrides_view_seed() {
        let identity = identity();
        let default_ctx = Ctx::new();
        let mut call = Ctx::new();
        call.insert("component".to_string(), json!("override"));

        let mut p = parts(&identity, &default_ctx, Some(call));
        p.component = Some("seeded");
        let ev = assemble(p);
        assert_eq!(ev.component.as_deref(), Some("override"));
    }

    #[test]
    fn test_default_ctx_reserved_key_not_hoisted() {
        let identity = identity();
        let mut default_ctx = Ctx::new();
        default_ctx.insert("component".to_string(), json!("from-defaults"));

        let ev = assemble(parts(&identity, &default_ctx, None));
        assert_eq!(ev.component, None);
        assert_eq!(ev.ctx["component"], json!("from-defaults"));
    }

    #[test]
    fn test_wire_shape_uses_camel_case() {
        let identity = identity();
        let default_ctx = Ctx::new();
        let mut call = Ctx::new();
        call.insert("traceId".to_string(), json!("t-9"));

        let ev = assemble(parts(&identity, &default_ctx, Some(call)));
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["traceId"], json!("t-9"));
        assert_eq!(json["sessionId"], json!("s-1"));
        assert_eq!(json["lvl"], json!("info"));
        assert_eq!(json["env"], json!("test"));
        // empty ctx and absent options are omitted from the wire
        assert!(json.get("ctx").is_none());
        assert!(json.get("err").is_none());
        assert!(json.get("component").is_none());
    }

    #[test]
    fn test_wire_round_trip() {
        let identity = identity();
        let default_ctx = Ctx::new();
        let mut call = Ctx::new();
        call.insert("k".to_string(), json!([1, 2]));

        let ev = assemble(parts(&identity, &default_ctx, Some(call)));
        let line = serde_json::to_string(&ev).unwrap();
        let back: LogEvent = serde_json::from_str(&line).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_error_info_from_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let info = ErrorInfo::from_error(&io);
        assert_eq!(info.message, "denied");
        assert_eq!(info.name.as_deref(), Some("Error"));
        assert_eq!(info.code, None);
    }

    #[test]
    fn test_error_info_code_forms() {
        let symbolic = ErrorInfo::new("boom").with_code("E_BOOM");
        assert_eq!(
            serde_json::to_value(&symbolic).unwrap()["code"],
            json!("E_BOOM")
        );
        let numeric = ErrorInfo::new("boom").with_code(500);
        assert_eq!(serde_json::to_value(&numeric).unwrap()["code"], json!(500));
    }
}
