//! Bounded batch queue
//!
//! Holds accepted events until the next flush. The hard capacity is
//! independent of the flush-trigger batch size: even with flushing starved,
//! memory stays bounded because every append evicts oldest-first past the
//! cap.

use crate::core::event::LogEvent;
use std::collections::VecDeque;

/// Hard upper bound on queued events
pub const HARD_CAPACITY: usize = 10_000;

#[derive(Debug)]
pub struct BatchQueue {
    events: VecDeque<LogEvent>,
    capacity: usize,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::with_capacity(HARD_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append one event, evicting oldest entries past the capacity.
    ///
    /// Returns how many events were evicted.
    pub fn push(&mut self, event: LogEvent) -> usize {
        self.events.push_back(event);
        let mut evicted = 0;
        while self.events.len() > self.capacity {
            self.events.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Remove and return everything currently queued, in insertion order.
    pub fn drain(&mut self) -> Vec<LogEvent> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for BatchQueue {
    fn default() -> Self {
        Self::new()
    }
}
