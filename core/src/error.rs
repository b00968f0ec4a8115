//! Errors raised when a configuration or a data set cannot be evaluated.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KnnError>;

#[derive(Error, Debug)]
pub enum KnnError {
    /// The number of neighbors must be in `1..=available`.
    #[error("invalid neighbor count k={k}: must be between 1 and {available}")]
    InvalidK { k: usize, available: usize },

    /// The Minkowski order must be at least 1 and small enough for distances
    /// to stay finite.
    #[error("invalid Minkowski order p={0}: must be at least 1 and keep distances finite")]
    InvalidOrder(u32),

    #[error("empty query set")]
    EmptyQuerySet,

    #[error("empty reference set")]
    EmptyReferenceSet,

    #[error("no worker threads available")]
    NoWorkers,

    /// Partitioning left no query to evaluate.
    #[error("no query assigned to any worker ({queries} queries over {workers} workers)")]
    EmptyPartition { queries: usize, workers: usize },

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{images} images but {labels} labels")]
    LengthMismatch { images: usize, labels: usize },

    #[error("label {label} at index {index} is not a digit")]
    LabelOutOfRange { index: usize, label: u8 },

    #[error("buffer of {len} bytes is not a whole number of {dimensions}-byte vectors")]
    RaggedBuffer { len: usize, dimensions: usize },

    #[error("cannot build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl KnnError {
    pub fn invalid_k(k: usize, available: usize) -> Self {
        Self::InvalidK { k, available }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }
}
