//! Transport trait for batch delivery sinks

use crate::core::{error::Result, event::LogEvent};

/// A delivery sink for flushed batches.
///
/// Transports are externally owned; the engine only invokes this contract
/// and tolerates any failure from it, including panics. `write` receives a
/// contiguous, order-preserving batch. `flush` forces out any
/// transport-internal buffering and runs after every `write`; `destroy`
/// runs once at engine destruction.
pub trait Transport: Send + Sync {
    fn write(&mut self, batch: &[LogEvent]) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn destroy(&mut self) {}

    fn name(&self) -> &str;
}
