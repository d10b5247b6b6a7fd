//! Console transport
//!
//! Human-readable output for development: one formatted line per event,
//! warn and error routed to stderr, the rest to stdout.

use crate::core::{Level, LogEvent, Result, Transport};
use chrono::DateTime;
use colored::Colorize;

pub struct ConsoleTransport {
    use_colors: bool,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn format_event(&self, event: &LogEvent) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", event.lvl.label())
                .color(event.lvl.color_code())
                .to_string()
        } else {
            format!("{:5}", event.lvl.label())
        };

        let timestamp = DateTime::from_timestamp_millis(event.ts)
            .map(|ts| ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
            .unwrap_or_else(|| event.ts.to_string());

        let mut line = format!(
            "[{}] [{}] {} {}",
            timestamp,
            level_str,
            event.component.as_deref().unwrap_or(&event.app),
            event.event
        );

        if !event.ctx.is_empty() {
            if let Ok(json) = serde_json::to_string(&event.ctx) {
                line.push(' ');
                line.push_str(&json);
            }
        }
        if let Some(err) = &event.err {
            line.push_str(&format!(" error={}", err.message));
        }
        if let Some(trace_id) = &event.trace_id {
            line.push_str(&format!(" trace={}", trace_id));
        }

        line
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ConsoleTransport {
    fn write(&mut self, batch: &[LogEvent]) -> Result<()> {
        for event in batch {
            let line = self.format_event(event);
            match event.lvl {
                Level::Warn | Level::Error => eprintln!("{}", line),
                _ => println!("{}", line),
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
