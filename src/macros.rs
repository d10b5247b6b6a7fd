//! Logging macros for ergonomic event emission.
//!
//! `ctx!` builds a context map from `key => value` pairs, and the level
//! macros wrap the corresponding logger methods.
//!
//! # Examples
//!
//! ```no_run
//! use batchlog::{ctx, info, warn, Env, Logger, LoggerConfig};
//! use batchlog::transports::StdoutTransport;
//!
//! let logger = Logger::new(
//!     LoggerConfig::new("shop", Env::Development).with_transport(StdoutTransport::new()),
//! );
//!
//! info!(logger, "cart.checkout");
//! info!(logger, "cart.checkout", "items" => 3, "total" => 42.50);
//! warn!(logger, "stock.low", "sku" => "A-100");
//! ```

/// Build a `Ctx` map from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so anything serializable works.
///
/// # Examples
///
/// ```
/// use batchlog::ctx;
///
/// let ctx = ctx! { "user" => "ada", "attempts" => 3 };
/// assert_eq!(ctx["attempts"], 3);
///
/// let empty = ctx! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! ctx {
    () => {
        $crate::Ctx::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Ctx::new();
        $( map.insert(($key).to_string(), $crate::serde_json::json!($value)); )+
        map
    }};
}

/// Log at an explicit level.
///
/// ```no_run
/// # use batchlog::{log, Env, Level, Logger, LoggerConfig};
/// # let logger = Logger::new(LoggerConfig::new("app", Env::Test));
/// log!(logger, Level::Warn, "disk.low");
/// log!(logger, Level::Info, "job.done", "id" => 7);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $event:expr) => {
        $logger.log($level, $event, None, None)
    };
    ($logger:expr, $level:expr, $event:expr, $($key:expr => $value:expr),+ $(,)?) => {
        $logger.log($level, $event, Some($crate::ctx! { $($key => $value),+ }), None)
    };
}

/// Log a debug-level event.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $event:expr) => {
        $crate::log!($logger, $crate::Level::Debug, $event)
    };
    ($logger:expr, $event:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Debug, $event, $($rest)+)
    };
}

/// Log an info-level event.
#[macro_export]
macro_rules! info {
    ($logger:expr, $event:expr) => {
        $crate::log!($logger, $crate::Level::Info, $event)
    };
    ($logger:expr, $event:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Info, $event, $($rest)+)
    };
}

/// Log a warn-level event.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $event:expr) => {
        $crate::log!($logger, $crate::Level::Warn, $event)
    };
    ($logger:expr, $event:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Warn, $event, $($rest)+)
    };
}

/// Log an error-level event.
#[macro_export]
macro_rules! error {
    ($logger:expr, $event:expr) => {
        $crate::log!($logger, $crate::Level::Error, $event)
    };
    ($logger:expr, $event:expr, $($rest:tt)+) => {
        $crate::log!($logger, $crate::Level::Error, $event, $($rest)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Env, Level, Logger, LoggerConfig};

    #[test]
    fn test_ctx_macro() {
        let ctx = ctx! { "user" => "ada", "count" => 2 };
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx["user"], "ada");
        assert_eq!(ctx["count"], 2);
    }

    #[test]
    fn test_ctx_macro_empty() {
        let ctx = ctx! {};
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_level_macros_compile_against_logger() {
        let logger = Logger::new(LoggerConfig::new("macro-test", Env::Test));
        log!(logger, Level::Info, "plain");
        debug!(logger, "dbg", "k" => 1);
        info!(logger, "inf");
        warn!(logger, "wrn", "k" => true);
        error!(logger, "err", "code" => "E1");
    }
}
