//! Error types for the logger

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// A context-mutation API was used before any engine was initialized
    #[error("Logger not initialized")]
    NotInitialized,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Event serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error from a transport sink
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-specific failure (generic)
    #[error("Transport '{transport}' failed: {message}")]
    TransportFailed { transport: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a transport failure error
    pub fn transport(transport: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::TransportFailed {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }
}
