use crate::events::EventKind;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load database from {location}: {source}")]
    Load {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt database file {location}: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("Failed to save database to {location}: {source}")]
    Save {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Listener for '{event}' event failed: {source}")]
    Listener {
        event: EventKind,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl StoreError {
    /// Whether the error came from writing the durable location.
    pub fn is_save_failure(&self) -> bool {
        matches!(self, StoreError::Save { .. } | StoreError::Serialization(_))
    }
}
