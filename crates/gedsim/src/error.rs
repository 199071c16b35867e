use thiserror::Error;

/// Errors that can occur in gedsim.
#[derive(Error, Debug)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Structure-layer error (dataset, GED lookup, tensorization).
    #[error(transparent)]
    Core(#[from] gedsim_core::Error),

    /// Layer error.
    #[error(transparent)]
    Nn(#[from] gedsim_nn::Error),

    /// Checkpoint IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inconsistent run configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Test pair sequence does not divide into query blocks.
    #[error(
        "test layout invalid: {pairs} pairs do not divide into blocks of {block_size} query graphs"
    )]
    InvalidTestLayout { pairs: usize, block_size: usize },
}

/// Result type alias for gedsim.
pub type Result<T> = std::result::Result<T, Error>;
