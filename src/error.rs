//! Error types for the clustering engine.

use thiserror::Error;

/// All errors that can be reported by this crate.
///
/// Argument errors are raised before any parallel work starts, so a failed call never leaves
/// partially written results behind.
#[derive(Error, Debug)]
pub enum KMeansError {
    /// An argument violates a precondition (k out of range, malformed buffers, bad metric setup).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Two point sets that have to share their dimensionality do not.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The metric produced a value that is not a finite number.
    #[error("Numeric error: {0}")]
    NumericError(String),

    /// Seeding was stopped through the progress callback.
    #[error("Seeding cancelled after {centers_chosen} center(s) were chosen")]
    Cancelled { centers_chosen: usize },

    /// The per-call worker pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, KMeansError>;
