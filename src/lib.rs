//! # Batchlog
//!
//! A structured event logger with level filtering, per-level sampling,
//! batched delivery, and pluggable transports.
//!
//! ## Features
//!
//! - **Structured Events**: every call becomes a uniform, serializable record
//! - **Bounded Memory**: hard-capped batch queue with oldest-first eviction
//! - **Pluggable Transports**: console, JSONL stdout, and HTTP delivery
//! - **Failure Isolation**: a broken transport never reaches the caller
//! - **Child Loggers**: component-scoped views over one shared engine

pub mod core;
pub mod init;
pub mod macros;
pub mod transports;

pub mod prelude {
    pub use crate::core::{
        BatchQueue, ChildLogger, Clock, Ctx, Env, ErrorCode, ErrorInfo, Level, LifecycleEvents,
        LifecycleGuard, LogEvent, Logger, LoggerConfig, LoggerError, LoggerMetrics, Result,
        SampleRates, SystemClock, Transport,
    };
    pub use crate::init::{
        get_logger, initialize_logger, set_default_log_context, shutdown_logger, FallbackLogger,
        LoggerHandle,
    };
}

pub use crate::core::{
    BatchQueue, ChildLogger, Clock, Ctx, Env, ErrorCode, ErrorInfo, Level, LifecycleEvents,
    LifecycleGuard, LogEvent, Logger, LoggerConfig, LoggerError, LoggerMetrics, Result,
    SampleRates, SystemClock, Transport,
};
pub use crate::init::{
    get_logger, initialize_logger, set_default_log_context, shutdown_logger, FallbackLogger,
    LoggerHandle,
};

// Re-exported for the `ctx!` macro expansion.
#[doc(hidden)]
pub use serde_json;
