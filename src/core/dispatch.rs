//! Transport dispatch with per-transport failure isolation
//!
//! Every transport call is wrapped in `catch_unwind` so one broken sink
//! cannot stop delivery to the rest or reach the caller of `log`/`flush`.
//! Failures are counted in metrics and otherwise absorbed: no retry, no
//! surfacing.

use crate::core::error::Result;
use crate::core::event::LogEvent;
use crate::core::metrics::LoggerMetrics;
use crate::core::transport::Transport;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Hand one batch to every transport, then run each flush hook.
pub(crate) fn dispatch_batch(
    transports: &mut [Box<dyn Transport>],
    batch: &[LogEvent],
    metrics: &LoggerMetrics,
) {
    for transport in transports.iter_mut() {
        if !isolated(|| transport.write(batch)) {
            metrics.record_transport_failure();
        }
        if !isolated(|| transport.flush()) {
            metrics.record_transport_failure();
        }
    }
}

/// Run every transport's flush and destroy hooks at engine destruction.
pub(crate) fn dispatch_destroy(transports: &mut [Box<dyn Transport>], metrics: &LoggerMetrics) {
    for transport in transports.iter_mut() {
        if !isolated(|| transport.flush()) {
            metrics.record_transport_failure();
        }
        if !isolated(|| {
            transport.destroy();
            Ok(())
        }) {
            metrics.record_transport_failure();
        }
    }
}

/// Returns false when the call errored or panicked.
fn isolated(call: impl FnOnce() -> Result<()>) -> bool {
    matches!(catch_unwind(AssertUnwindSafe(call)), Ok(Ok(())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Env;
    use crate::core::error::LoggerError;
    use crate::core::event::Ctx;
    use crate::core::level::Level;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn event(name: &str) -> LogEvent {
        LogEvent {
            ts: 0,
            lvl: Level::Info,
            app: "test".to_string(),
            env: Env::Test,
            ver: None,
            component: None,
            event: name.to_string(),
            ctx: Ctx::new(),
            err: None,
            trace_id: None,
            session_id: "s".to_string(),
        }
    }

    struct Counting {
        writes: Arc<AtomicUsize>,
        flushes: Arc<AtomicUsize>,
        destroys: Arc<AtomicUsize>,
    }

    impl Transport for Counting {
        fn write(&mut self, _batch: &[LogEvent]) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn destroy(&mut self) {
            self.destroys.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct Failing;

    impl Transport for Failing {
        fn write(&mut self, _batch: &[LogEvent]) -> Result<()> {
            Err(LoggerError::other("simulated failure"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Panicking;

    impl Transport for Panicking {
        fn write(&mut self, _batch: &[LogEvent]) -> Result<()> {
            panic!("transport bug");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_failure_does_not_block_remaining_transports() {
        let writes = Arc::new(AtomicUsize::new(0));
        let flushes = Arc::new(AtomicUsize::new(0));
        let destroys = Arc::new(AtomicUsize::new(0));
        let mut transports: Vec<Box<dyn Transport>> = vec![
            Box::new(Failing),
            Box::new(Panicking),
            Box::new(Counting {
                writes: Arc::clone(&writes),
                flushes: Arc::clone(&flushes),
                destroys: Arc::clone(&destroys),
            }),
        ];
        let metrics = LoggerMetrics::new();

        dispatch_batch(&mut transports, &[event("a")], &metrics);

        assert_eq!(writes.load(Ordering::SeqCst), 1);
        assert_eq!(flushes.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.transport_failures(), 2);
    }

    #[test]
    fn test_destroy_hooks_are_isolated_too() {
        let writes = Arc::new(AtomicUsize::new(0));
        let flushes = Arc::new(AtomicUsize::new(0));
        let destroys = Arc::new(AtomicUsize::new(0));
        let mut transports: Vec<Box<dyn Transport>> = vec![
            Box::new(Panicking),
            Box::new(Counting {
                writes: Arc::clone(&writes),
                flushes: Arc::clone(&flushes),
                destroys: Arc::clone(&destroys),
            }),
        ];
        let metrics = LoggerMetrics::new();

        dispatch_destroy(&mut transports, &metrics);

        assert_eq!(flushes.load(Ordering::SeqCst), 1);
        assert_eq!(destroys.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_flush_hook_runs_after_each_write() {
        let writes = Arc::new(AtomicUsize::new(0));
        let flushes = Arc::new(AtomicUsize::new(0));
        let destroys = Arc::new(AtomicUsize::new(0));
        let mut transports: Vec<Box<dyn Transport>> = vec![Box::new(Counting {
            writes: Arc::clone(&writes),
            flushes: Arc::clone(&flushes),
            destroys: Arc::clone(&destroys),
        })];
        let metrics = LoggerMetrics::new();

        dispatch_batch(&mut transports, &[event("a"), event("b")], &metrics);
        dispatch_batch(&mut transports, &[event("c")], &metrics);

        assert_eq!(writes.load(Ordering::SeqCst), 2);
        assert_eq!(flushes.load(Ordering::SeqCst), 2);
        assert_eq!(metrics.transport_failures(), 0);
    }
}
