//! HTTP transport
//!
//! Posts each batch as a JSON array to a collector endpoint. Delivery runs
//! on a dedicated worker thread behind a bounded channel, so `write`
//! returns without waiting on the network; a full channel or a failed
//! request drops that batch.

use crate::core::{LogEvent, LoggerError, Result, Transport};
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Batches buffered ahead of the network before new ones are dropped
const PENDING_BATCHES: usize = 64;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Bound on draining the worker at destroy time
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpTransport {
    endpoint: String,
    sender: Option<Sender<String>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let (sender, receiver) = bounded::<String>(PENDING_BATCHES);

        let url = endpoint.clone();
        let worker = thread::spawn(move || {
            let client = match reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
            {
                Ok(client) => client,
                // No client, no delivery; drain until the sender hangs up.
                Err(_) => {
                    for _ in receiver.iter() {}
                    return;
                }
            };
            for body in receiver.iter() {
                let _ = client
                    .post(&url)
                    .header("content-type", "application/json")
                    .body(body)
                    .send();
            }
        });

        Self {
            endpoint,
            sender: Some(sender),
            worker: Some(worker),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn write(&mut self, batch: &[LogEvent]) -> Result<()> {
        let body = serde_json::to_string(batch)?;
        match &self.sender {
            Some(sender) => match sender.try_send(body) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => {
                    Err(LoggerError::transport("http", "delivery queue full, batch dropped"))
                }
                Err(TrySendError::Disconnected(_)) => {
                    Err(LoggerError::transport("http", "delivery worker stopped"))
                }
            },
            None => Err(LoggerError::transport("http", "transport destroyed")),
        }
    }

    // Delivery is asynchronous by design; there is no buffer to force here.

    fn destroy(&mut self) {
        drop(self.sender.take());
        if let Some(worker) = self.worker.take() {
            let started = Instant::now();
            while !worker.is_finished() {
                if started.elapsed() >= SHUTDOWN_TIMEOUT {
                    // In-flight request outlived the bound; abandon the
                    // thread rather than block host shutdown.
                    return;
                }
                thread::sleep(Duration::from_millis(10));
            }
            let _ = worker.join();
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        self.destroy();
    }
}
