//! Per-level probabilistic sampling
//!
//! Rates are clamped into [0, 1] when configured, not when drawn. The
//! boundary values are exact: a rate of 1.0 always admits and 0.0 never
//! does, with fast paths ahead of the RNG draw.

use crate::core::level::Level;
use rand::Rng;

/// Per-level emission probabilities
///
/// # Example
///
/// ```
/// use batchlog::{Level, SampleRates};
///
/// // Keep 10% of debug events, everything else untouched
/// let rates = SampleRates::default().with_rate(Level::Debug, 0.1);
/// assert_eq!(rates.rate(Level::Debug), 0.1);
/// assert_eq!(rates.rate(Level::Error), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRates {
    debug: f64,
    info: f64,
    warn: f64,
    error: f64,
}

impl Default for SampleRates {
    fn default() -> Self {
        Self {
            debug: 1.0,
            info: 1.0,
            warn: 1.0,
            error: 1.0,
        }
    }
}

impl SampleRates {
    /// Same rate for every level, clamped into [0, 1]
    pub fn uniform(rate: f64) -> Self {
        let rate = clamp_rate(rate);
        Self {
            debug: rate,
            info: rate,
            warn: rate,
            error: rate,
        }
    }

    /// Set the rate for one level, clamped into [0, 1]
    #[must_use]
    pub fn with_rate(mut self, level: Level, rate: f64) -> Self {
        let rate = clamp_rate(rate);
        match level {
            Level::Debug => self.debug = rate,
            Level::Info => self.info = rate,
            Level::Warn => self.warn = rate,
            Level::Error => self.error = rate,
        }
        self
    }

    pub fn rate(&self, level: Level) -> f64 {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warn => self.warn,
            Level::Error => self.error,
        }
    }

    /// Draw once against the level's rate.
    pub fn admits(&self, level: Level) -> bool {
        let rate = self.rate(level);
        if rate >= 1.0 {
            return true;
        }
        if rate <= 0.0 {
            return false;
        }
        rand::thread_rng().gen::<f64>() < rate
    }
}

fn clamp_rate(rate: f64) -> f64 {
    // NaN compares false both ways; treat it as "never emit"
    if rate.is_nan() {
        return 0.0;
    }
    rate.clamp(0.0, 1.0)
}
