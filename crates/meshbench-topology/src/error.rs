//! Error types for topology planning

use thiserror::Error;

/// Result type for topology-planner operations
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors that can occur while building the catalog, overlay or allocation
#[derive(Error, Debug)]
pub enum TopologyError {
    /// The peer population is too small to build a meaningful catalog
    #[error("need at least one non-origin peer plus origin, got {0} peers")]
    InsufficientPeers(usize),

    /// A partitioner-supplied overlay mapping violates the overlay
    /// invariants (coverage, reachability, non-empty super-peer leaf sets)
    #[error("overlay mapping is invalid: {0}")]
    OverlayInvalid(String),

    /// A source peer has no upload budget at all
    #[error("peer {0} has no uplink budget (max_upload == 0)")]
    NoUplinkBudget(String),

    /// Internal invariant violation: the two-pass allocator produced a sum
    /// exceeding the source's upload budget. Should never happen for a
    /// correctly implemented allocator; surfaced rather than panicking so a
    /// single bad plan fails the run instead of the process.
    #[error("allocation for {source} sums to {allocated}, exceeding max_upload {budget}")]
    OverAllocation {
        source: String,
        allocated: u32,
        budget: u32,
    },
}
