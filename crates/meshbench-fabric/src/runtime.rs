//! Container-runtime and shaping-applier collaborator seams
//!
//! §1 treats the container runtime that provides isolated network
//! namespaces, and the shaping mechanism itself, as external collaborators
//! with a contractually stated interface. These two traits are that
//! interface; `meshbench-fabric` ships one in-process reference
//! implementation of each ([`crate::local::LocalProcessRuntime`],
//! [`crate::local::NoopShapingApplier`]) for single-host smoke runs and
//! tests. A real namespace-backed runtime is out of scope.

use crate::description::FabricDescription;
use crate::error::FabricResult;
use async_trait::async_trait;

/// A handle to one launched endpoint, returned by
/// [`ContainerRuntime::launch`].
#[async_trait]
pub trait EndpointHandle: Send + Sync {
    /// Endpoint name as it appears in the fabric description.
    fn name(&self) -> &str;

    /// Wait for the endpoint's workload process to exit, reaping it.
    async fn wait(&mut self) -> FabricResult<()>;

    /// Terminate the endpoint's workload process if still running.
    async fn kill(&mut self);
}

/// External collaborator: provides isolated network namespaces and command
/// execution for a fabric description's endpoints.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Materialize `description` and launch every endpoint's workload
    /// process, returning one handle per endpoint in `description` order.
    async fn launch(&self, description: &FabricDescription) -> FabricResult<Vec<Box<dyn EndpointHandle>>>;
}

/// External collaborator: the shaping mechanism itself (an external
/// traffic-control facility on each endpoint). Applies the per-edge
/// latency/bandwidth/loss rules described by a node's shaping script and
/// reports completion.
#[async_trait]
pub trait ShapingApplier: Send + Sync {
    /// Apply shaping for `endpoint` and signal completion. Implementations
    /// that cannot observe true completion (e.g. a no-op stand-in) should
    /// still resolve promptly so callers relying on the "shaping complete"
    /// barrier (§4.4.3) are not stalled indefinitely.
    async fn apply(&self, endpoint: &str) -> FabricResult<()>;
}
