//! Error types for transfer orchestration

use thiserror::Error;

/// Result type for transfer-orchestrator operations
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors that can occur while running a transfer role or the tracker
#[derive(Error, Debug)]
pub enum TransferError {
    /// A listener failed to bind after exhausting its retry budget
    #[error("bind retry exhausted on {addr}: {source}")]
    BindRetry { addr: String, #[source] source: std::io::Error },

    /// A connector failed to establish a working connection after
    /// exhausting its retry budget
    #[error("connect retry exhausted toward {addr} after {attempts} attempts")]
    ConnectRetry { addr: String, attempts: u32 },

    /// The tracker did not observe `expected` confirmations before its
    /// deadline
    #[error("barrier incomplete: observed {observed}/{expected} confirmations before deadline")]
    BarrierIncomplete { observed: usize, expected: usize },

    /// The run-wide deadline elapsed before the orchestrator completed
    #[error("run deadline of {0:?} elapsed")]
    RunDeadline(std::time::Duration),

    /// A `ROLE`/`CONNECTION_<i>`/etc. environment variable was missing or
    /// malformed
    #[error("invalid endpoint environment: {0}")]
    InvalidEnvironment(String),

    /// Underlying I/O failure not covered by a more specific variant
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
