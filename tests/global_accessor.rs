//! Global accessor lifecycle
//!
//! The installed engine is process-wide, so the whole lifecycle runs as one
//! sequential test: fallback before init, engine views after, atomic
//! re-initialization, and teardown.

use batchlog::prelude::*;
use batchlog::{ctx, Level};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default)]
struct RecordingTransport {
    batches: Arc<Mutex<Vec<Vec<LogEvent>>>>,
    destroys: Arc<AtomicUsize>,
}

impl RecordingTransport {
    fn events(&self) -> Vec<LogEvent> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    fn event_names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event).collect()
    }
}

impl Transport for RecordingTransport {
    fn write(&mut self, batch: &[LogEvent]) -> batchlog::Result<()> {
        self.batches.lock().push(batch.to_vec());
        Ok(())
    }

    fn destroy(&mut self) {
        self.destroys.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn config(sink: &RecordingTransport) -> LoggerConfig {
    LoggerConfig::new("global-app", Env::Test)
        .with_max_batch(1_000)
        .with_flush_interval(Duration::from_secs(3600))
        .with_transport(sink.clone())
}

#[test]
fn test_global_accessor_lifecycle() {
    // Uninitialized: context mutation is caller misuse, logging is not.
    assert!(matches!(
        set_default_log_context(ctx! { "k" => "v" }),
        Err(LoggerError::NotInitialized)
    ));
    let fallback = get_logger(Some("boot"));
    assert!(!fallback.is_engine());
    fallback.info("starting", Some(ctx! { "step" => 1 }));
    fallback.flush();
    let timed = fallback.time("warmup", None, || 3);
    assert_eq!(timed, 3);

    // Install an engine; views now route through it.
    let first = RecordingTransport::default();
    initialize_logger(config(&first));

    let root = get_logger(None);
    assert!(root.is_engine());
    root.info("root.event", None);

    let auth = get_logger(Some("auth"));
    auth.info("login", Some(ctx! { "traceId" => "t-1" }));
    let nested = auth.child("tokens", None);
    nested.warn("expiring", None);
    nested.flush();

    let events = first.events();
    assert_eq!(
        first.event_names(),
        vec!["root.event", "login", "expiring"]
    );
    assert_eq!(events[0].component, None);
    assert_eq!(events[1].component.as_deref(), Some("auth"));
    assert_eq!(events[1].trace_id.as_deref(), Some("t-1"));
    assert_eq!(events[2].component.as_deref(), Some("auth.tokens"));
    // One engine instance, one session id across every view.
    assert_eq!(events[0].session_id, events[2].session_id);

    // Live default-context mutation applies to later events.
    set_default_log_context(ctx! { "region" => "eu" }).unwrap();
    get_logger(None).info("tagged", None);
    get_logger(None).flush();
    let events = first.events();
    assert_eq!(events.last().unwrap().ctx["region"], json!("eu"));

    // Re-initialization tears the old engine down (flush + destroy) before
    // the new one takes over.
    let stale = get_logger(Some("stale"));
    stale.info("buffered", None);
    let second = RecordingTransport::default();
    initialize_logger(config(&second));

    assert_eq!(first.destroys.load(Ordering::SeqCst), 1);
    assert_eq!(first.event_names().last().unwrap(), "buffered");

    // Views over the replaced engine are inert; new views deliver to the
    // replacement.
    stale.info("lost", None);
    stale.flush();
    get_logger(None).log(Level::Info, "fresh", None, None);
    get_logger(None).flush();
    assert!(!first.event_names().contains(&"lost".to_string()));
    assert_eq!(second.event_names(), vec!["fresh"]);

    // Teardown: back to fallback and explicit misuse errors.
    shutdown_logger();
    assert_eq!(second.destroys.load(Ordering::SeqCst), 1);
    assert!(set_default_log_context(ctx! { "k" => "v" }).is_err());
    assert!(!get_logger(None).is_engine());

    // A second shutdown is a no-op.
    shutdown_logger();
    assert_eq!(second.destroys.load(Ordering::SeqCst), 1);
}
