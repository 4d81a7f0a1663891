//! Error types for persistence and chart export.
//!
//! None of these ever escape `MetricsStore::record_event`; they exist so
//! the explicit save/load/export calls can tell the host what happened.

use thiserror::Error;

/// Failures of the underlying key-value substrate.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StorageError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_refusal() || e.is_connection_dropped() || e.is_io_error() {
            Self::Unavailable(e.to_string())
        } else {
            Self::Command(e.to_string())
        }
    }
}

/// Failures of a save or load of the whole metrics snapshot.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("no persistence backend configured")]
    Disabled,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize metrics: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("stored metrics payload is corrupt: {0}")]
    CorruptPayload(#[source] serde_json::Error),
}

impl PersistError {
    /// Short machine-readable tag used in HTTP status bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Storage(StorageError::Unavailable(_)) => "unavailable",
            Self::Storage(StorageError::Command(_)) => "storage",
            Self::Serialize(_) => "serialize",
            Self::CorruptPayload(_) => "corrupt",
        }
    }
}

/// Failures while rendering or writing a histogram chart.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unknown endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("export i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}
