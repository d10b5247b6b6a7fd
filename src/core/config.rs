//! Logger configuration

use crate::core::event::Ctx;
use crate::core::level::Level;
use crate::core::runtime::{Clock, LifecycleEvents, SystemClock};
use crate::core::sampling::SampleRates;
use crate::core::transport::Transport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Queue length that triggers an immediate flush
pub const DEFAULT_MAX_BATCH: usize = 20;
/// Period of the background flush timer
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(5000);

/// Deployment environment carried on every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Development,
    Test,
    Production,
}

impl Env {
    /// Minimum level used when none is configured explicitly
    pub fn default_level(self) -> Level {
        match self {
            Env::Production => Level::Info,
            Env::Development | Env::Test => Level::Debug,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Env::Development => "development",
            Env::Test => "test",
            Env::Production => "production",
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Env::Development),
            "test" => Ok(Env::Test),
            "production" | "prod" => Ok(Env::Production),
            _ => Err(format!("Invalid environment: '{}'", s)),
        }
    }
}

/// Static identity fields copied onto every event
#[derive(Debug, Clone)]
pub(crate) struct Identity {
    pub app: String,
    pub env: Env,
    pub ver: Option<String>,
}

/// Initialization options for one engine instance
///
/// Knob values are clamped rather than rejected: sample rates into [0, 1],
/// `max_batch` to at least 1, `flush_interval` to at least 1 ms.
///
/// # Example
///
/// ```no_run
/// use batchlog::{Env, Level, Logger, LoggerConfig, SampleRates};
/// use batchlog::transports::StdoutTransport;
/// use std::time::Duration;
///
/// let logger = Logger::new(
///     LoggerConfig::new("checkout", Env::Production)
///         .with_version("2.4.0")
///         .with_level(Level::Info)
///         .with_sample(SampleRates::default().with_rate(Level::Debug, 0.1))
///         .with_max_batch(50)
///         .with_flush_interval(Duration::from_secs(2))
///         .with_transport(StdoutTransport::new()),
/// );
/// logger.info("service.start", None);
/// ```
pub struct LoggerConfig {
    pub(crate) app: String,
    pub(crate) env: Env,
    pub(crate) ver: Option<String>,
    pub(crate) level: Option<Level>,
    pub(crate) sample: SampleRates,
    pub(crate) default_ctx: Ctx,
    pub(crate) max_batch: usize,
    pub(crate) flush_interval: Duration,
    pub(crate) transports: Vec<Box<dyn Transport>>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) lifecycle: Option<Box<dyn LifecycleEvents>>,
}

impl LoggerConfig {
    pub fn new(app: impl Into<String>, env: Env) -> Self {
        Self {
            app: app.into(),
            env,
            ver: None,
            level: None,
            sample: SampleRates::default(),
            default_ctx: Ctx::new(),
            max_batch: DEFAULT_MAX_BATCH,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            transports: Vec::new(),
            clock: Box::new(SystemClock),
            lifecycle: None,
        }
    }

    #[must_use]
    pub fn with_version(mut self, ver: impl Into<String>) -> Self {
        self.ver = Some(ver.into());
        self
    }

    /// Override the environment-derived minimum level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn with_sample(mut self, sample: SampleRates) -> Self {
        self.sample = sample;
        self
    }

    /// Context merged into every event, lowest precedence
    #[must_use]
    pub fn with_default_ctx(mut self, default_ctx: Ctx) -> Self {
        self.default_ctx = default_ctx;
        self
    }

    #[must_use]
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Add a transport; call repeatedly for fan-out
    #[must_use]
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transports.push(Box::new(transport));
        self
    }

    #[must_use]
    pub fn with_boxed_transports(mut self, transports: Vec<Box<dyn Transport>>) -> Self {
        self.transports.extend(transports);
        self
    }

    /// Override the timestamp source
    #[must_use]
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Supply the host's shutdown-notification source
    #[must_use]
    pub fn with_lifecycle<L: LifecycleEvents + 'static>(mut self, lifecycle: L) -> Self {
        self.lifecycle = Some(Box::new(lifecycle));
        self
    }

    /// Effective minimum level after environment defaulting
    pub(crate) fn effective_level(&self) -> Level {
        self.level.unwrap_or_else(|| self.env.default_level())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_default_level() {
        assert_eq!(Env::Production.default_level(), Level::Info);
        assert_eq!(Env::Development.default_level(), Level::Debug);
        assert_eq!(Env::Test.default_level(), Level::Debug);
    }

    #[test]
    fn test_env_wire_format() {
        assert_eq!(serde_json::to_string(&Env::Production).unwrap(), "\"production\"");
        let parsed: Env = serde_json::from_str("\"development\"").unwrap();
        assert_eq!(parsed, Env::Development);
    }

    #[test]
    fn test_env_parse() {
        assert_eq!("prod".parse::<Env>().unwrap(), Env::Production);
        assert_eq!("Test".parse::<Env>().unwrap(), Env::Test);
        assert!("staging".parse::<Env>().is_err());
    }

    #[test]
    fn test_explicit_level_overrides_env() {
        let config = LoggerConfig::new("app", Env::Production).with_level(Level::Debug);
        assert_eq!(config.effective_level(), Level::Debug);

        let config = LoggerConfig::new("app", Env::Production);
        assert_eq!(config.effective_level(), Level::Info);
    }

    #[test]
    fn test_knobs_clamped() {
        let config = LoggerConfig::new("app", Env::Test)
            .with_max_batch(0)
            .with_flush_interval(Duration::ZERO);
        assert_eq!(config.max_batch, 1);
        assert_eq!(config.flush_interval, Duration::from_millis(1));
    }
}
