//! Per-endpoint environment variable schema (§6)
//!
//! Endpoints are separate processes; the only contract between the Fabric
//! Builder and the Transfer Orchestrator is this environment variable
//! schema, not a shared Rust type, so a fabric built by a different
//! container runtime still drives the same orchestrator binary.

use crate::connection::ConnectionInfo;
use std::net::Ipv4Addr;

/// `ROLE` values the orchestrator dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Origin,
    SuperPeer,
    Leaf,
    Tracker,
}

impl EndpointRole {
    pub fn as_str(self) -> &'static str {
        match self {
            EndpointRole::Origin => "origin",
            EndpointRole::SuperPeer => "superpeer",
            EndpointRole::Leaf => "leaf",
            EndpointRole::Tracker => "tracker",
        }
    }
}

/// Everything the Fabric Builder computes for one endpoint, ready to be
/// rendered into its environment.
#[derive(Debug, Clone)]
pub struct EndpointPlan {
    pub name: String,
    pub role: EndpointRole,
    pub total_peers: usize,
    pub ip_address: Ipv4Addr,
    /// Management IP of the confirmation tracker (§4.4.2); every non-tracker
    /// endpoint needs this to report completion.
    pub tracker_ip: Ipv4Addr,
    /// Peer this endpoint receives the artifact from (unset for `origin`).
    pub source_peer: Option<String>,
    /// Management IP of `source_peer`, so the receiver can connect without
    /// a separate directory lookup.
    pub source_peer_ip: Option<Ipv4Addr>,
    /// This endpoint's super-peer, if it is a leaf under the two-tier
    /// overlay (unset for star overlay leaves, origin, and super-peers).
    pub super_peer: Option<String>,
    pub super_peer_ip: Option<Ipv4Addr>,
    /// Outbound overlay edges from this endpoint, in overlay emission
    /// order.
    pub connections: Vec<ConnectionInfo>,
}

impl EndpointPlan {
    /// Render this plan into the `(key, value)` environment schema of §6.
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("ROLE".to_string(), self.role.as_str().to_string()),
            ("TOTAL_PEERS".to_string(), self.total_peers.to_string()),
            ("IP_ADDRESS".to_string(), self.ip_address.to_string()),
            ("TRACKER_IP".to_string(), self.tracker_ip.to_string()),
        ];

        if let Some(source) = &self.source_peer {
            env.push(("SOURCE_PEER".to_string(), source.clone()));
        }
        if let Some(source_ip) = self.source_peer_ip {
            env.push(("SOURCE_PEER_IP".to_string(), source_ip.to_string()));
        }
        if let Some(super_peer) = &self.super_peer {
            env.push(("SUPER_PEER".to_string(), super_peer.clone()));
        }
        if let Some(super_peer_ip) = self.super_peer_ip {
            env.push(("SUPER_PEER_IP".to_string(), super_peer_ip.to_string()));
        }
        if !self.connections.is_empty() {
            let targets: Vec<&str> = self.connections.iter().map(|c| c.target_peer.as_str()).collect();
            env.push(("TARGET_PEERS".to_string(), targets.join(",")));
            for (i, connection) in self.connections.iter().enumerate() {
                env.push((format!("CONNECTION_{}", i + 1), connection.encode()));
            }
        }

        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_expected_keys_for_a_superpeer_with_two_leaves() {
        let plan = EndpointPlan {
            name: "1".to_string(),
            role: EndpointRole::SuperPeer,
            total_peers: 10,
            ip_address: Ipv4Addr::new(10, 200, 0, 3),
            tracker_ip: Ipv4Addr::new(10, 200, 0, 254),
            source_peer: Some("origin".to_string()),
            source_peer_ip: Some(Ipv4Addr::new(10, 200, 0, 2)),
            super_peer: None,
            super_peer_ip: None,
            connections: vec![
                ConnectionInfo::new("veth0", Ipv4Addr::new(10, 101, 0, 2), "2", Ipv4Addr::new(10, 101, 0, 3)),
                ConnectionInfo::new("veth1", Ipv4Addr::new(10, 102, 0, 2), "3", Ipv4Addr::new(10, 102, 0, 3)),
            ],
        };

        let env = plan.to_env_vars();
        let map: std::collections::HashMap<&str, &str> =
            env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(map["ROLE"], "superpeer");
        assert_eq!(map["SOURCE_PEER"], "origin");
        assert_eq!(map["TARGET_PEERS"], "2,3");
        assert_eq!(map["CONNECTION_1"], "veth0:10.101.0.2,2:10.101.0.3");
        assert_eq!(map["CONNECTION_2"], "veth1:10.102.0.2,3:10.102.0.3");
    }

    #[test]
    fn origin_has_no_source_peer() {
        let plan = EndpointPlan {
            name: "origin".to_string(),
            role: EndpointRole::Origin,
            total_peers: 10,
            ip_address: Ipv4Addr::new(10, 200, 0, 2),
            tracker_ip: Ipv4Addr::new(10, 200, 0, 254),
            source_peer: None,
            source_peer_ip: None,
            super_peer: None,
            super_peer_ip: None,
            connections: vec![],
        };
        let env = plan.to_env_vars();
        assert!(env.iter().all(|(k, _)| k != "SOURCE_PEER"));
    }
}
