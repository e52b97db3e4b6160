//! Error types for edge validation and integrity checks

use thiserror::Error;

pub type ValidatorResult<T> = Result<T, ValidatorError>;

#[derive(Error, Debug)]
pub enum ValidatorError {
    /// A probed edge's measured bandwidth or latency fell outside its
    /// tolerance band after the retry budget was exhausted.
    #[error("shaping drift on edge {source}->{target}: bw_error={bw_error:.2}% lat_error={lat_error:.2}%")]
    ShapingDrift { source: String, target: String, bw_error: f64, lat_error: f64 },

    /// None of the candidate received-artifact paths existed for an
    /// endpoint.
    #[error("no received artifact found for endpoint {0} among candidate paths")]
    MissingArtifact(String),

    /// The received artifact's hash did not match the origin's.
    #[error("hash mismatch for endpoint {0}")]
    HashMismatch(String),

    /// Underlying probe I/O failure not covered by a more specific variant.
    #[error("probe I/O error: {0}")]
    Io(#[from] std::io::Error),
}
