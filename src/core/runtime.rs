//! Runtime capability providers
//!
//! The engine never detects its host environment. The embedding application
//! supplies a timestamp source and, when it wants shutdown integration, a
//! lifecycle-signal source (a process signal handler, a page-unload bridge,
//! a test channel). The core stays runtime-agnostic.

use chrono::Utc;

/// Timestamp source for event build time
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall-clock provider used unless the configuration overrides it
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Hook invoked when the host runtime is shutting down
pub type ShutdownHook = Box<dyn Fn() + Send + Sync>;

/// Source of host shutdown notifications.
///
/// Implementations deliver the hook on whatever thread suits them; the hook
/// is idempotent. `detach` via the returned guard must not block on the
/// thread that delivers hooks.
pub trait LifecycleEvents: Send + Sync {
    fn on_shutdown(&self, hook: ShutdownHook) -> LifecycleGuard;
}

/// Detaches a shutdown registration when dropped
pub struct LifecycleGuard {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl LifecycleGuard {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Guard for providers with nothing to detach
    pub fn noop() -> Self {
        Self { detach: None }
    }
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for LifecycleGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleGuard")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}
