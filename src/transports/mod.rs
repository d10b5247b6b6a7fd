//! Transport implementations

#[cfg(feature = "console")]
pub mod console;
#[cfg(feature = "http")]
pub mod http;
pub mod stdout;

#[cfg(feature = "console")]
pub use console::ConsoleTransport;
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use stdout::StdoutTransport;

// Re-export the contract next to its implementations
pub use crate::core::Transport;
