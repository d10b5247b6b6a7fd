//! Logger engine and child-logger views
//!
//! One `EngineCore` owns the policy fields, the batch queue, the transport
//! set, and the flush-timer thread. `Logger` is the owning handle;
//! `ChildLogger` is a cloneable component-scoped view that delegates every
//! call into the same shared pipeline.

use crate::core::config::{Identity, LoggerConfig};
use crate::core::dispatch::{dispatch_batch, dispatch_destroy};
use crate::core::event::{assemble, Ctx, ErrorInfo, EventParts, LogEvent};
use crate::core::level::Level;
use crate::core::metrics::LoggerMetrics;
use crate::core::queue::BatchQueue;
use crate::core::runtime::{Clock, LifecycleEvents, LifecycleGuard};
use crate::core::sampling::SampleRates;
use crate::core::transport::Transport;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::{Mutex, RwLock};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Context key carrying the measured duration of a timed operation
pub(crate) const DURATION_MS_KEY: &str = "durationMs";

/// Background machinery torn down at destruction
#[derive(Default)]
struct FlushWorker {
    shutdown_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    lifecycle: Option<LifecycleGuard>,
    // Kept alive so a provider's delivery machinery outlives registration.
    lifecycle_source: Option<Box<dyn LifecycleEvents>>,
}

pub(crate) struct EngineCore {
    identity: Identity,
    min_level: RwLock<Level>,
    sample: SampleRates,
    default_ctx: RwLock<Ctx>,
    session_id: String,
    max_batch: usize,
    transports: RwLock<Vec<Box<dyn Transport>>>,
    queue: Mutex<BatchQueue>,
    clock: Box<dyn Clock>,
    metrics: LoggerMetrics,
    destroyed: AtomicBool,
    worker: Mutex<FlushWorker>,
}

impl EngineCore {
    /// Level gate, then one sampling draw. Rejection has no side effect.
    fn admitted(&self, lvl: Level) -> bool {
        if lvl < *self.min_level.read() {
            return false;
        }
        self.sample.admits(lvl)
    }

    /// The full pipeline for one call: policy, build, enqueue, size check.
    pub(crate) fn log_from(
        &self,
        component: Option<&str>,
        extra: Option<&Ctx>,
        lvl: Level,
        event: &str,
        ctx: Option<Ctx>,
        err: Option<ErrorInfo>,
    ) {
        if self.destroyed.load(Ordering::Acquire) {
            return;
        }
        if !self.admitted(lvl) {
            return;
        }

        let event = {
            let default_ctx = self.default_ctx.read();
            assemble(EventParts {
                identity: &self.identity,
                session_id: &self.session_id,
                ts: self.clock.now_millis(),
                lvl,
                event,
                component,
                extra,
                ctx,
                default_ctx: &*default_ctx,
                err,
            })
        };

        let should_flush = {
            let mut queue = self.queue.lock();
            let evicted = queue.push(event);
            self.metrics.record_queued();
            self.metrics.record_evicted(evicted as u64);
            queue.len() >= self.max_batch
        };
        if should_flush {
            self.flush();
        }
    }

    /// Drain the queue and fan the batch out to every transport.
    ///
    /// The transport lock is held across drain + dispatch so batches reach
    /// transports in drain order; events appended after the drain belong to
    /// the next batch. Empty queue or no transports: no-op, events stay put.
    pub(crate) fn flush(&self) {
        let mut transports = self.transports.write();
        if transports.is_empty() {
            return;
        }
        let batch = {
            let mut queue = self.queue.lock();
            if queue.is_empty() {
                return;
            }
            queue.drain()
        };
        dispatch_batch(&mut transports, &batch, &self.metrics);
        self.metrics.record_batch_flushed();
    }

    /// Tear down: detach lifecycle, stop the timer, final flush, release
    /// transports. Idempotent.
    pub(crate) fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        let (lifecycle, source, shutdown_tx, handle) = {
            let mut worker = self.worker.lock();
            (
                worker.lifecycle.take(),
                worker.lifecycle_source.take(),
                worker.shutdown_tx.take(),
                worker.handle.take(),
            )
        };
        drop(lifecycle);
        drop(source);
        // Disconnecting the channel wakes the timer thread immediately.
        drop(shutdown_tx);
        if let Some(handle) = handle {
            let _ = handle.join();
        }

        self.flush();

        let mut transports = self.transports.write();
        dispatch_destroy(&mut transports, &self.metrics);
        transports.clear();
    }

    pub(crate) fn set_level(&self, level: Level) {
        *self.min_level.write() = level;
    }

    pub(crate) fn set_default_context(&self, patch: Ctx) {
        let mut default_ctx = self.default_ctx.write();
        for (key, value) in patch {
            default_ctx.insert(key, value);
        }
    }

    pub(crate) fn set_transports(&self, transports: Vec<Box<dyn Transport>>) {
        *self.transports.write() = transports;
    }
}

fn flush_loop(core: Weak<EngineCore>, shutdown_rx: Receiver<()>, interval: Duration) {
    loop {
        match shutdown_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => match core.upgrade() {
                Some(core) => core.flush(),
                None => break,
            },
            // Shutdown message or disconnected channel
            _ => break,
        }
    }
}

/// Emits the `<event>.done` timing record when dropped, so the measurement
/// survives early returns, `?`, and panics in the measured operation.
pub(crate) struct EmitOnDrop<F: FnOnce(u64)> {
    started: Instant,
    emit: Option<F>,
}

impl<F: FnOnce(u64)> EmitOnDrop<F> {
    pub(crate) fn new(emit: F) -> Self {
        Self {
            started: Instant::now(),
            emit: Some(emit),
        }
    }
}

impl<F: FnOnce(u64)> Drop for EmitOnDrop<F> {
    fn drop(&mut self) {
        if let Some(emit) = self.emit.take() {
            emit(self.started.elapsed().as_millis() as u64);
        }
    }
}

/// Merge `durationMs` under the caller's timing context (caller keys win).
pub(crate) fn duration_ctx(duration_ms: u64, ctx: Option<Ctx>) -> Ctx {
    let mut timed = Ctx::new();
    timed.insert(
        DURATION_MS_KEY.to_string(),
        serde_json::Value::from(duration_ms),
    );
    if let Some(ctx) = ctx {
        for (key, value) in ctx {
            timed.insert(key, value);
        }
    }
    timed
}

fn timed<'a>(
    core: &'a EngineCore,
    component: Option<&'a str>,
    extra: Option<&'a Ctx>,
    event: &'a str,
    ctx: Option<Ctx>,
) -> EmitOnDrop<impl FnOnce(u64) + 'a> {
    EmitOnDrop::new(move |duration_ms| {
        core.log_from(
            component,
            extra,
            Level::Info,
            &format!("{}.done", event),
            Some(duration_ctx(duration_ms, ctx)),
            None,
        );
    })
}

/// Owning handle for one engine instance.
///
/// Dropping the handle destroys the engine: the flush timer stops, pending
/// events are flushed, and every transport receives its destroy hook.
///
/// # Example
///
/// ```no_run
/// use batchlog::{Env, Logger, LoggerConfig};
/// use batchlog::transports::StdoutTransport;
///
/// let logger = Logger::new(
///     LoggerConfig::new("shop", Env::Development).with_transport(StdoutTransport::new()),
/// );
/// let auth = logger.child("auth", None);
/// auth.info("login.ok", None);
/// logger.shutdown();
/// ```
pub struct Logger {
    core: Arc<EngineCore>,
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Self {
        let LoggerConfig {
            app,
            env,
            ver,
            level,
            sample,
            default_ctx,
            max_batch,
            flush_interval,
            transports,
            clock,
            lifecycle,
        } = config;

        let min_level = level.unwrap_or_else(|| env.default_level());
        let core = Arc::new(EngineCore {
            identity: Identity { app, env, ver },
            min_level: RwLock::new(min_level),
            sample,
            default_ctx: RwLock::new(default_ctx),
            session_id: Uuid::new_v4().simple().to_string(),
            max_batch,
            transports: RwLock::new(transports),
            queue: Mutex::new(BatchQueue::new()),
            clock,
            metrics: LoggerMetrics::new(),
            destroyed: AtomicBool::new(false),
            worker: Mutex::new(FlushWorker::default()),
        });

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let timer_core = Arc::downgrade(&core);
        let handle = thread::spawn(move || flush_loop(timer_core, shutdown_rx, flush_interval));

        // The hook holds a weak reference: a registration must not keep a
        // replaced engine alive.
        let (lifecycle_guard, lifecycle_source) = match lifecycle {
            Some(source) => {
                let hook_core = Arc::downgrade(&core);
                let guard = source.on_shutdown(Box::new(move || {
                    if let Some(core) = hook_core.upgrade() {
                        core.destroy();
                    }
                }));
                (Some(guard), Some(source))
            }
            None => (None, None),
        };

        {
            let mut worker = core.worker.lock();
            worker.shutdown_tx = Some(shutdown_tx);
            worker.handle = Some(handle);
            worker.lifecycle = lifecycle_guard;
            worker.lifecycle_source = lifecycle_source;
        }

        Self { core }
    }

    pub fn log(&self, lvl: Level, event: &str, ctx: Option<Ctx>, err: Option<ErrorInfo>) {
        self.core.log_from(None, None, lvl, event, ctx, err);
    }

    #[inline]
    pub fn debug(&self, event: &str, ctx: Option<Ctx>) {
        self.log(Level::Debug, event, ctx, None);
    }

    #[inline]
    pub fn info(&self, event: &str, ctx: Option<Ctx>) {
        self.log(Level::Info, event, ctx, None);
    }

    #[inline]
    pub fn warn(&self, event: &str, ctx: Option<Ctx>) {
        self.log(Level::Warn, event, ctx, None);
    }

    #[inline]
    pub fn error(&self, event: &str, ctx: Option<Ctx>, err: Option<ErrorInfo>) {
        self.log(Level::Error, event, ctx, err);
    }

    /// Error event from any `std::error::Error` value
    pub fn error_with<E>(&self, event: &str, ctx: Option<Ctx>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log(Level::Error, event, ctx, Some(ErrorInfo::from_error(err)));
    }

    /// Measure `op`, emit one `info` event named `<event>.done` with
    /// `durationMs`, and pass the result through unchanged. The timing
    /// record is emitted whether `op` returns, errors, or panics.
    pub fn time<T>(&self, event: &str, ctx: Option<Ctx>, op: impl FnOnce() -> T) -> T {
        let _timer = timed(&self.core, None, None, event, ctx);
        op()
    }

    /// `time` for futures; suspension happens only inside `op`.
    pub async fn time_async<T, F>(&self, event: &str, ctx: Option<Ctx>, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let _timer = timed(&self.core, None, None, event, ctx);
        op.await
    }

    /// Component-scoped view sharing this engine's queue and schedule
    pub fn child(&self, component: impl Into<String>, extra: Option<Ctx>) -> ChildLogger {
        ChildLogger {
            core: Arc::clone(&self.core),
            component: Some(component.into()),
            extra: extra.unwrap_or_default(),
        }
    }

    pub(crate) fn root_view(&self) -> ChildLogger {
        ChildLogger {
            core: Arc::clone(&self.core),
            component: None,
            extra: Ctx::new(),
        }
    }

    pub fn flush(&self) {
        self.core.flush();
    }

    /// Flush pending events, stop the timer, and release all transports
    pub fn shutdown(self) {
        self.core.destroy();
    }

    pub fn set_level(&self, level: Level) {
        self.core.set_level(level);
    }

    /// Merge a patch into the default context (patch keys win)
    pub fn set_default_context(&self, patch: Ctx) {
        self.core.set_default_context(patch);
    }

    /// Replace the transport set. Replaced transports are dropped without
    /// their destroy hooks; use `shutdown` for full teardown.
    pub fn set_transports(&self, transports: Vec<Box<dyn Transport>>) {
        self.core.set_transports(transports);
    }

    pub fn session_id(&self) -> &str {
        &self.core.session_id
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.core.metrics
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.core.destroy();
    }
}

/// A context-bound view over a shared engine, not an independent instance.
///
/// Prepends its fixed component path and extra context to every call, then
/// delegates to the parent engine's pipeline. Nesting joins paths with `.`
/// and merges extras with child keys winning.
#[derive(Clone)]
pub struct ChildLogger {
    core: Arc<EngineCore>,
    component: Option<String>,
    extra: Ctx,
}

impl ChildLogger {
    pub fn log(&self, lvl: Level, event: &str, ctx: Option<Ctx>, err: Option<ErrorInfo>) {
        self.core
            .log_from(self.component.as_deref(), Some(&self.extra), lvl, event, ctx, err);
    }

    #[inline]
    pub fn debug(&self, event: &str, ctx: Option<Ctx>) {
        self.log(Level::Debug, event, ctx, None);
    }

    #[inline]
    pub fn info(&self, event: &str, ctx: Option<Ctx>) {
        self.log(Level::Info, event, ctx, None);
    }

    #[inline]
    pub fn warn(&self, event: &str, ctx: Option<Ctx>) {
        self.log(Level::Warn, event, ctx, None);
    }

    #[inline]
    pub fn error(&self, event: &str, ctx: Option<Ctx>, err: Option<ErrorInfo>) {
        self.log(Level::Error, event, ctx, err);
    }

    pub fn error_with<E>(&self, event: &str, ctx: Option<Ctx>, err: &E)
    where
        E: std::error::Error + ?Sized,
    {
        self.log(Level::Error, event, ctx, Some(ErrorInfo::from_error(err)));
    }

    pub fn time<T>(&self, event: &str, ctx: Option<Ctx>, op: impl FnOnce() -> T) -> T {
        let _timer = timed(
            &self.core,
            self.component.as_deref(),
            Some(&self.extra),
            event,
            ctx,
        );
        op()
    }

    pub async fn time_async<T, F>(&self, event: &str, ctx: Option<Ctx>, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let _timer = timed(
            &self.core,
            self.component.as_deref(),
            Some(&self.extra),
            event,
            ctx,
        );
        op.await
    }

    /// Derive a deeper view; paths join with `.`, extras merge (child wins)
    pub fn child(&self, component: impl Into<String>, extra: Option<Ctx>) -> ChildLogger {
        let component = component.into();
        let path = match &self.component {
            Some(parent) => format!("{}.{}", parent, component),
            None => component,
        };
        let mut merged = self.extra.clone();
        if let Some(extra) = extra {
            for (key, value) in extra {
                merged.insert(key, value);
            }
        }
        ChildLogger {
            core: Arc::clone(&self.core),
            component: Some(path),
            extra: merged,
        }
    }

    pub fn flush(&self) {
        self.core.flush();
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }
}
