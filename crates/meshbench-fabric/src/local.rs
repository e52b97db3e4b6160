//! Reference [`ContainerRuntime`]/[`ShapingApplier`] for single-host runs
//!
//! A builder process constructs a command, a runtime spawns and reaps it.
//! Here every "endpoint" is a child process on the local host running the
//! `meshbench-transfer` role binary with its computed environment, instead
//! of a namespace-isolated container — useful for smoke runs and tests, not
//! a substitute for the real runtime.

use crate::description::FabricDescription;
use crate::error::{FabricError, FabricResult};
use crate::runtime::{ContainerRuntime, EndpointHandle, ShapingApplier};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Spawns each endpoint's workload as a local child process.
pub struct LocalProcessRuntime {
    /// Path to the `meshbench-transfer` role binary. Defaults to the
    /// sibling binary in the current executable's directory.
    binary_path: PathBuf,
}

impl LocalProcessRuntime {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self { binary_path: binary_path.into() }
    }
}

#[async_trait]
impl ContainerRuntime for LocalProcessRuntime {
    async fn launch(&self, description: &FabricDescription) -> FabricResult<Vec<Box<dyn EndpointHandle>>> {
        let mut handles: Vec<Box<dyn EndpointHandle>> = Vec::with_capacity(description.topology.nodes.len());

        for (name, node) in &description.topology.nodes {
            let mut cmd = Command::new(&self.binary_path);
            cmd.args(&node.cmd);
            for (key, value) in &node.env {
                cmd.env(key, value);
            }
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

            debug!(endpoint = name.as_str(), binary = %self.binary_path.display(), "launching endpoint process");
            let child = cmd.spawn().map_err(|source| FabricError::Launch { endpoint: name.clone(), source })?;

            info!(endpoint = name.as_str(), pid = ?child.id(), "endpoint process launched");
            handles.push(Box::new(LocalEndpointHandle { name: name.clone(), process: Some(child) }));
        }

        Ok(handles)
    }
}

struct LocalEndpointHandle {
    name: String,
    process: Option<Child>,
}

#[async_trait]
impl EndpointHandle for LocalEndpointHandle {
    fn name(&self) -> &str {
        &self.name
    }

    async fn wait(&mut self) -> FabricResult<()> {
        if let Some(mut child) = self.process.take() {
            let status = child.wait().await.map_err(|source| FabricError::Launch { endpoint: self.name.clone(), source })?;
            if !status.success() {
                warn!(endpoint = self.name.as_str(), code = ?status.code(), "endpoint process exited non-zero");
            }
        }
        Ok(())
    }

    async fn kill(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.start_kill();
        }
    }
}

impl Drop for LocalEndpointHandle {
    fn drop(&mut self) {
        if let Some(child) = &mut self.process {
            if child.try_wait().ok().flatten().is_none() {
                warn!(endpoint = self.name.as_str(), "endpoint process still running at drop, killing");
                let _ = child.start_kill();
            }
        }
    }
}

/// A `ShapingApplier` that treats shaping as instantaneous: suitable for
/// single-host smoke runs over loopback/local sockets where there is no
/// actual traffic-control facility to drive. A namespace-backed runtime
/// would instead exec each endpoint's shaping script and await its exit.
pub struct NoopShapingApplier;

#[async_trait]
impl ShapingApplier for NoopShapingApplier {
    async fn apply(&self, endpoint: &str) -> FabricResult<()> {
        debug!(endpoint, "no-op shaping applier: treating shaping as already complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{MgmtNetwork, Node, TopologySection};
    use std::collections::BTreeMap;

    fn description_with_one_node(cmd: Vec<String>) -> FabricDescription {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "1".to_string(),
            Node {
                kind: "process".to_string(),
                image: "n/a".to_string(),
                mgmt_ipv4: "10.200.0.2".to_string(),
                env: BTreeMap::new(),
                labels: BTreeMap::new(),
                binds: vec![],
                exec: None,
                cmd,
                ports: vec![],
            },
        );
        FabricDescription {
            name: "test".to_string(),
            prefix: "t".to_string(),
            mgmt: MgmtNetwork { network: "mgmt0".to_string(), ipv4_subnet: "10.200.0.0/24".to_string() },
            topology: TopologySection { nodes, links: vec![] },
        }
    }

    #[tokio::test]
    async fn launches_and_reaps_a_short_lived_process() {
        let runtime = LocalProcessRuntime::new("/bin/true");
        let description = description_with_one_node(vec![]);
        let mut handles = runtime.launch(&description).await.unwrap();
        assert_eq!(handles.len(), 1);
        handles[0].wait().await.unwrap();
    }

    #[tokio::test]
    async fn noop_shaping_applier_always_succeeds() {
        let applier = NoopShapingApplier;
        applier.apply("1").await.unwrap();
    }
}
