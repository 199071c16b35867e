use thiserror::Error;

/// Errors that can occur in gedsim-core.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// No ground-truth GED recorded for a graph pair.
    #[error("no GED entry for pair ({query}, {candidate})")]
    GedNotFound { query: usize, candidate: usize },

    /// Graph index out of range for the requested split.
    #[error("graph index {index} out of range ({len} graphs)")]
    GraphNotFound { index: usize, len: usize },

    /// A dataset collection that must be non-empty was empty.
    #[error("empty dataset: {0}")]
    EmptyDataset(String),
}

/// Result type alias for gedsim-core.
pub type Result<T> = std::result::Result<T, Error>;
