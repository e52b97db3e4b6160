//! Error types for peer sampling

use thiserror::Error;

/// Result type for sampler operations
pub type SamplerResult<T> = Result<T, SamplerError>;

/// Errors that can occur while sampling peer profiles
#[derive(Error, Debug)]
pub enum SamplerError {
    /// The rejection-sampling loop for a truncated normal failed to find a
    /// positive sample within the attempt budget
    #[error("unsatisfiable distribution after {attempts} attempts (mean={mean}, stddev={stddev})")]
    Unsatisfiable {
        attempts: u32,
        mean: f64,
        stddev: f64,
    },

    /// The requested peer count was zero or otherwise out of range
    #[error("invalid peer count: {0}")]
    InvalidPeerCount(usize),
}
