//! Stdout transport
//!
//! Single-line JSON per event (JSONL), the format log shippers expect.

use crate::core::{LogEvent, Result, Transport};
use std::io::{BufWriter, Stdout, Write};

pub struct StdoutTransport {
    writer: BufWriter<Stdout>,
}

impl StdoutTransport {
    pub fn new() -> Self {
        Self {
            writer: BufWriter::new(std::io::stdout()),
        }
    }
}

impl Default for StdoutTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StdoutTransport {
    fn write(&mut self, batch: &[LogEvent]) -> Result<()> {
        for event in batch {
            let json = serde_json::to_string(event)?;
            writeln!(self.writer, "{}", json)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stdout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Ctx, Env, Level};

    #[test]
    fn test_write_and_flush_batch() {
        let mut transport = StdoutTransport::new();
        let event = LogEvent {
            ts: 1,
            lvl: Level::Info,
            app: "shop".to_string(),
            env: Env::Test,
            ver: None,
            component: None,
            event: "boot".to_string(),
            ctx: Ctx::new(),
            err: None,
            trace_id: None,
            session_id: "s".to_string(),
        };
        assert!(transport.write(&[event]).is_ok());
        assert!(transport.flush().is_ok());
    }
}
