//! Error types surfaced to callers of the queue.
//!
//! Task failures are not errors of the queue itself: they are delivered to the
//! task's `fail` callback as a [`TaskFailure`](crate::queue::TaskFailure) and never
//! propagate past the attempt that produced them.

use std::path::PathBuf;

/// Errors returned synchronously by queue operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// The condition name was never registered with the queue
    #[error("Unknown condition: {0}")]
    UnknownCondition(String),
}

/// Errors while loading or saving a configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
