//! Process-wide logger installation and the uninitialized fallback
//!
//! At most one engine is active at a time. Re-initialization tears the
//! previous instance down before installing the replacement, all under one
//! write lock, so two flush schedules never coexist. Before any engine is
//! installed, `get_logger` hands out a degraded console logger instead of
//! failing.

use crate::core::event::{Ctx, ErrorInfo};
use crate::core::level::Level;
use crate::core::logger::{duration_ctx, ChildLogger, EmitOnDrop, Logger};
use crate::core::{LoggerConfig, LoggerError, Result};
use parking_lot::RwLock;
use std::future::Future;
use std::io::Write;

static ACTIVE: RwLock<Option<Logger>> = RwLock::new(None);

/// Install a new engine, tearing down any previous one first.
pub fn initialize_logger(config: LoggerConfig) {
    let mut slot = ACTIVE.write();
    if let Some(previous) = slot.take() {
        previous.shutdown();
    }
    *slot = Some(Logger::new(config));
}

/// Tear down the active engine, flushing pending events.
pub fn shutdown_logger() {
    if let Some(previous) = ACTIVE.write().take() {
        previous.shutdown();
    }
}

/// Merge a patch into the active engine's default context.
///
/// Unlike logging itself, mutating configuration before initialization is
/// caller misuse and surfaces as an error.
pub fn set_default_log_context(patch: Ctx) -> Result<()> {
    match &*ACTIVE.read() {
        Some(logger) => {
            logger.set_default_context(patch);
            Ok(())
        }
        None => Err(LoggerError::NotInitialized),
    }
}

/// Get a logger view, optionally scoped to a component.
///
/// With no active engine this returns a fallback that writes directly and
/// synchronously to stdout/stderr, with no batching, sampling, or
/// transports. It never fails.
pub fn get_logger(component: Option<&str>) -> LoggerHandle {
    let slot = ACTIVE.read();
    match slot.as_ref() {
        Some(logger) => {
            let view = match component {
                Some(component) => logger.child(component, None),
                None => logger.root_view(),
            };
            LoggerHandle {
                inner: HandleInner::Engine(view),
            }
        }
        None => LoggerHandle {
            inner: HandleInner::Fallback(FallbackLogger {
                component: component.map(str::to_string),
            }),
        },
    }
}

enum HandleInner {
    Engine(ChildLogger),
    Fallback(FallbackLogger),
}

/// A logger view from `get_logger`: either a live engine view or the
/// console fallback, with one call surface for both.
pub struct LoggerHandle {
    inner: HandleInner,
}

impl LoggerHandle {
    pub fn log(&self, lvl: Level, event: &str, ctx: Option<Ctx>, err: Option<ErrorInfo>) {
        match &self.inner {
            HandleInner::Engine(view) => view.log(lvl, event, ctx, err),
            HandleInner::Fallback(fallback) => fallback.log(lvl, event, ctx, err),
        }
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
        match &self.inner {
            HandleInner::Engine(view) => view.time(event, ctx, op),
            HandleInner::Fallback(fallback) => fallback.time(event, ctx, op),
        }
    }

    pub async fn time_async<T, F>(&self, event: &str, ctx: Option<Ctx>, op: F) -> T
    where
        F: Future<Output = T>,
    {
        match &self.inner {
            HandleInner::Engine(view) => view.time_async(event, ctx, op).await,
            HandleInner::Fallback(fallback) => fallback.time_async(event, ctx, op).await,
        }
    }

    pub fn child(&self, component: impl Into<String>, extra: Option<Ctx>) -> LoggerHandle {
        match &self.inner {
            HandleInner::Engine(view) => LoggerHandle {
                inner: HandleInner::Engine(view.child(component, extra)),
            },
            HandleInner::Fallback(fallback) => LoggerHandle {
                inner: HandleInner::Fallback(fallback.child(component)),
            },
        }
    }

    /// No-op on the fallback; engine views flush the shared queue
    pub fn flush(&self) {
        if let HandleInner::Engine(view) = &self.inner {
            view.flush();
        }
    }

    /// True when backed by a live engine
    pub fn is_engine(&self) -> bool {
        matches!(self.inner, HandleInner::Engine(_))
    }
}

/// Degraded logger used before initialization.
///
/// Writes one line per call, `[component] event {ctx} error=...`, warn and
/// error to stderr, the rest to stdout. Write failures are discarded so a
/// closed sink can never take the host down.
pub struct FallbackLogger {
    component: Option<String>,
}

impl FallbackLogger {
    pub fn log(&self, lvl: Level, event: &str, ctx: Option<Ctx>, err: Option<ErrorInfo>) {
        let mut line = String::new();
        if let Some(component) = &self.component {
            line.push_str(&format!("[{}] ", component));
        }
        line.push_str(event);
        if let Some(ctx) = ctx {
            if !ctx.is_empty() {
                if let Ok(json) = serde_json::to_string(&ctx) {
                    line.push(' ');
                    line.push_str(&json);
                }
            }
        }
        if let Some(err) = err {
            line.push_str(&format!(" error={}", err.message));
        }

        match lvl {
            Level::Warn | Level::Error => {
                let _ = writeln!(std::io::stderr().lock(), "{}", line);
            }
            Level::Debug | Level::Info => {
                let _ = writeln!(std::io::stdout().lock(), "{}", line);
            }
        }
    }

    pub fn time<T>(&self, event: &str, ctx: Option<Ctx>, op: impl FnOnce() -> T) -> T {
        let _timer = EmitOnDrop::new(|duration_ms| {
            self.log(
                Level::Info,
                &format!("{}.done", event),
                Some(duration_ctx(duration_ms, ctx)),
                None,
            );
        });
        op()
    }

    pub async fn time_async<T, F>(&self, event: &str, ctx: Option<Ctx>, op: F) -> T
    where
        F: Future<Output = T>,
    {
        let _timer = EmitOnDrop::new(|duration_ms| {
            self.log(
                Level::Info,
                &format!("{}.done", event),
                Some(duration_ctx(duration_ms, ctx)),
                None,
            );
        });
        op.await
    }

    fn child(&self, component: impl Into<String>) -> FallbackLogger {
        let component = component.into();
        FallbackLogger {
            component: Some(match &self.component {
                Some(parent) => format!("{}.{}", parent, component),
                None => component,
            }),
        }
    }
}
