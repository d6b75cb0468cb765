//! Error types for the log router

use std::time::Duration;

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A single sink failed to write a record
    #[error("Sink '{sink}' write failed: {source}")]
    SinkWrite {
        sink: String,
        #[source]
        source: Box<RouterError>,
    },

    /// One or more children of a tee failed; siblings were still attempted
    #[error("{} sink write(s) failed", .0.len())]
    SinkWrites(Vec<RouterError>),

    /// A bounded flush did not drain the backlog in time
    #[error("Flush did not complete within {timeout:?}")]
    FlushTimeout { timeout: Duration },

    /// Delivery to the reporting backend failed
    #[error("Report delivery failed: {0}")]
    DeliveryError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl RouterError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        RouterError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Wrap a write failure with the failing sink's name
    pub fn sink_write(sink: impl Into<String>, source: RouterError) -> Self {
        RouterError::SinkWrite {
            sink: sink.into(),
            source: Box::new(source),
        }
    }

    /// Create a delivery error
    pub fn delivery(msg: impl Into<String>) -> Self {
        RouterError::DeliveryError(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        RouterError::Other(msg.into())
    }
}
