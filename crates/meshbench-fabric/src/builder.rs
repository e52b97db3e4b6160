//! Fabric Builder: translates a topology plan into a declarative fabric
//! description plus the per-endpoint plans the env-var schema is rendered
//! from (§4.3).

use crate::connection::ConnectionInfo;
use crate::description::{FabricDescription, LinkEndpoints, MgmtNetwork, Node, TopologySection};
use crate::env::{EndpointPlan, EndpointRole};
use crate::error::FabricResult;
use crate::ip::{LinkAllocator, ManagementAllocator};
use crate::shaping::render_shaping_script;
use meshbench_topology::{AllocatedEdge, Overlay, OverlayVariant, Topology};
use std::collections::BTreeMap;
use std::collections::HashMap;
use tracing::info;

/// Endpoint name of the confirmation tracker (§4.4.2). Not a peer in the
/// topology model; reachable from every endpoint over the management plane.
pub const TRACKER_NAME: &str = "tracker";

/// Container image placeholder for process-kind endpoints; the
/// namespace-backed runtime contract (§4.3) expects a real image, the
/// `LocalProcessRuntime` reference implementation ignores this field.
const WORKLOAD_IMAGE: &str = "meshbench/endpoint:local";

/// Output of [`FabricBuilder::build`]: the declarative description handed
/// to the container runtime, plus the per-endpoint plans the description's
/// `env` maps were rendered from (kept around so the Validator can look up
/// an endpoint's management IP without re-parsing the description).
pub struct FabricPlan {
    pub description: FabricDescription,
    pub endpoint_plans: BTreeMap<String, EndpointPlan>,
    /// `connection-details-N.json`-equivalent artifact content, bound
    /// read-only into every endpoint.
    pub allocated_edge_artifact_json: String,
}

/// Translates a topology plan into a fabric description.
pub struct FabricBuilder {
    pub fabric_name: String,
    pub prefix: String,
}

impl FabricBuilder {
    pub fn new(fabric_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self { fabric_name: fabric_name.into(), prefix: prefix.into() }
    }

    /// Build the fabric description for `topology`/`overlay`/`allocated`,
    /// sized for a transfer of `file_bytes`.
    pub fn build(
        &self,
        topology: &Topology,
        overlay: &Overlay,
        allocated: &[AllocatedEdge],
    ) -> FabricResult<FabricPlan> {
        let mut mgmt = ManagementAllocator::new();
        let mut links = LinkAllocator::new();

        let mut mgmt_ips = HashMap::new();
        mgmt_ips.insert(TRACKER_NAME.to_string(), mgmt.allocate()?);
        for peer in &topology.peers {
            mgmt_ips.insert(peer.name.clone(), mgmt.allocate()?);
        }

        let allocated_by_edge: HashMap<(&str, &str), &AllocatedEdge> =
            allocated.iter().map(|e| ((e.source.as_str(), e.target.as_str()), e)).collect();

        // Super-peer lookup: the source-of-truth for SUPER_PEER/SUPER_PEER_IP
        // is "this leaf's source is a super-peer, not origin".
        let superpeers: std::collections::HashSet<&str> = overlay.superpeers.iter().map(|s| s.as_str()).collect();

        // source_of[target] = source peer name, from the overlay (every
        // non-origin peer has exactly one overlay predecessor, §3).
        let mut source_of: HashMap<&str, &str> = HashMap::new();
        for edge in &overlay.edges {
            source_of.insert(edge.target.as_str(), edge.source.as_str());
        }

        let targets_by_source = overlay.targets_by_source();

        let mut endpoint_plans = BTreeMap::new();
        let mut nodes = BTreeMap::new();
        let mut links_section = Vec::new();
        let mut iface_counters: HashMap<&str, usize> = HashMap::new();

        for peer in &topology.peers {
            let name = peer.name.as_str();
            let role = if peer.is_origin() {
                EndpointRole::Origin
            } else if superpeers.contains(name) {
                EndpointRole::SuperPeer
            } else {
                EndpointRole::Leaf
            };

            let source_peer = source_of.get(name).map(|s| s.to_string());
            let source_peer_ip = source_peer.as_deref().and_then(|s| mgmt_ips.get(s).copied());
            let (super_peer, super_peer_ip) = match (role, &source_peer) {
                (EndpointRole::Leaf, Some(source)) if overlay.variant == OverlayVariant::TwoTier && superpeers.contains(source.as_str()) => {
                    (Some(source.clone()), mgmt_ips.get(source.as_str()).copied())
                }
                _ => (None, None),
            };

            let mut connections = Vec::new();
            if let Some(targets) = targets_by_source.get(name) {
                for &target in targets {
                    let link = links.allocate()?;
                    let idx = iface_counters.entry(name).or_insert(0);
                    let iface = format!("veth{idx}");
                    *idx += 1;
                    connections.push(ConnectionInfo::new(iface.clone(), link.source_ip, target, link.target_ip));
                    links_section.push(LinkEndpoints { endpoints: [format!("{name}:{iface}"), format!("{target}:veth-in")] });
                }
            }

            let plan = EndpointPlan {
                name: name.to_string(),
                role,
                total_peers: topology.peers.len() - 1,
                ip_address: mgmt_ips[name],
                tracker_ip: mgmt_ips[TRACKER_NAME],
                source_peer,
                source_peer_ip,
                super_peer,
                super_peer_ip,
                connections,
            };

            let edges_for_shaping: Vec<AllocatedEdge> = plan
                .connections
                .iter()
                .map(|c| (*allocated_by_edge.get(&(name, c.target_peer.as_str())).expect("overlay connection must have an allocated edge")).clone())
                .collect();
            let shaping_script = render_shaping_script(&plan.connections, &edges_for_shaping);

            let env: BTreeMap<String, String> = plan.to_env_vars().into_iter().collect();
            nodes.insert(
                name.to_string(),
                Node {
                    kind: "process".to_string(),
                    image: WORKLOAD_IMAGE.to_string(),
                    mgmt_ipv4: mgmt_ips[name].to_string(),
                    env,
                    labels: BTreeMap::from([("role".to_string(), role.as_str().to_string())]),
                    binds: vec!["connection-details.json:/app/connection-details.json:ro".to_string()],
                    exec: Some(shaping_script),
                    cmd: vec!["meshbench-endpoint".to_string()],
                    ports: vec![],
                },
            );
            endpoint_plans.insert(name.to_string(), plan);
        }

        // Tracker endpoint: reachable over mgmt only, no overlay edges.
        let tracker_env = BTreeMap::from([
            ("ROLE".to_string(), EndpointRole::Tracker.as_str().to_string()),
            ("IP_ADDRESS".to_string(), mgmt_ips[TRACKER_NAME].to_string()),
            ("TOTAL_PEERS".to_string(), (topology.peers.len() - 1).to_string()),
        ]);
        nodes.insert(
            TRACKER_NAME.to_string(),
            Node {
                kind: "process".to_string(),
                image: WORKLOAD_IMAGE.to_string(),
                mgmt_ipv4: mgmt_ips[TRACKER_NAME].to_string(),
                env: tracker_env,
                labels: BTreeMap::from([("role".to_string(), "tracker".to_string())]),
                binds: vec![],
                exec: None,
                cmd: vec!["meshbench-endpoint".to_string()],
                ports: vec![],
            },
        );

        let allocated_edge_artifact_json = meshbench_topology::AllocatedEdgeArtifact::to_json_array(allocated)
            .expect("allocated-edge list always serializes");

        info!(endpoints = nodes.len(), links = links_section.len(), "fabric description built");

        Ok(FabricPlan {
            description: FabricDescription {
                name: self.fabric_name.clone(),
                prefix: self.prefix.clone(),
                mgmt: MgmtNetwork { network: "mgmt0".to_string(), ipv4_subnet: ManagementAllocator::network_cidr() },
                topology: TopologySection { nodes, links: links_section },
            },
            endpoint_plans,
            allocated_edge_artifact_json,
        })
    }
}
