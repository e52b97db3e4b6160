//! Error types for fabric construction

use thiserror::Error;

/// Result type for fabric-builder operations
pub type FabricResult<T> = Result<T, FabricError>;

/// Errors that can occur while translating a plan into a fabric description
/// or driving the runtime/shaping collaborators
#[derive(Error, Debug)]
pub enum FabricError {
    /// The fixed management /24 ran out of addresses for the requested peer
    /// count
    #[error("management subnet exhausted after {0} endpoints")]
    ManagementSubnetExhausted(usize),

    /// The per-link /24 counter wrapped past its maximum number of links
    #[error("per-link subnet counter exhausted after {0} links")]
    LinkSubnetExhausted(usize),

    /// A `CONNECTION_<i>` environment value could not be parsed
    #[error("malformed connection record {raw:?}: {reason}")]
    MalformedConnection { raw: String, reason: &'static str },

    /// The container runtime collaborator failed to launch an endpoint
    #[error("failed to launch endpoint {endpoint}: {source}")]
    Launch { endpoint: String, source: std::io::Error },

    /// An endpoint did not report shaping complete before the fallback
    /// deadline
    #[error("endpoint {0} did not acknowledge shaping completion before the fallback deadline")]
    ShapingTimeout(String),
}
