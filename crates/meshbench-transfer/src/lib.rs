//! Transfer Orchestrator (C4): runs the per-endpoint roles and the
//! confirmation-tracker barrier that together produce one run's timing
//! measurements (§4.4).

pub mod endpoint;
pub mod error;
pub mod measurement;
pub mod pacing;
pub mod receiver;
pub mod retry;
pub mod role;
pub mod sender;
pub mod tracker;

pub use endpoint::{origin_artifact_path, received_artifact_path, run_role, tracker_socket_addr, EndpointOutcome};
pub use error::{TransferError, TransferResult};
pub use measurement::ConnectionMeasurement;
pub use pacing::{await_shaping_barrier, staircase_fallback_deadline};
pub use role::{LeafConfig, OriginConfig, Role, SuperPeerConfig, TrackerConfig, FILE_TRANSFER_PORT, TRACKER_PORT};
pub use tracker::{run_tracker, send_confirmation, BarrierOutcome};
