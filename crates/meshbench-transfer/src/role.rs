//! Role multiplexing (Design Notes §9)
//!
//! The source encodes origin/super-peer/leaf via polymorphism over
//! nullable peers; this is instead a tagged variant over the role enum,
//! each variant carrying only the configuration it needs.

use crate::error::{TransferError, TransferResult};
use meshbench_fabric::ConnectionInfo;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Fixed TCP port the origin/super-peer file-serving listener binds.
pub const FILE_TRANSFER_PORT: u16 = 7000;
/// Fixed TCP port the confirmation tracker listens on.
pub const TRACKER_PORT: u16 = 9000;

#[derive(Debug, Clone)]
pub struct OriginConfig {
    pub ip_address: Ipv4Addr,
    pub tracker_ip: Ipv4Addr,
    pub targets: Vec<ConnectionInfo>,
}

#[derive(Debug, Clone)]
pub struct SuperPeerConfig {
    pub ip_address: Ipv4Addr,
    pub tracker_ip: Ipv4Addr,
    pub source_peer: String,
    pub source_ip: Ipv4Addr,
    pub targets: Vec<ConnectionInfo>,
}

#[derive(Debug, Clone)]
pub struct LeafConfig {
    pub ip_address: Ipv4Addr,
    pub tracker_ip: Ipv4Addr,
    pub source_peer: String,
    pub source_ip: Ipv4Addr,
}

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub ip_address: Ipv4Addr,
    pub expected_confirmations: usize,
}

/// Tagged variant over the per-endpoint role, each carrying its own
/// configuration struct. No nullable peer fields.
#[derive(Debug, Clone)]
pub enum Role {
    Origin(OriginConfig),
    SuperPeer(SuperPeerConfig),
    Leaf(LeafConfig),
    Tracker(TrackerConfig),
}

impl Role {
    /// Parse the endpoint's role configuration from its process
    /// environment (§6's schema). Returns a typed error on any malformed
    /// or missing variable instead of propagating a partially-built
    /// config.
    pub fn from_env() -> TransferResult<Self> {
        let role = read_var("ROLE")?;
        let ip_address = read_var("IP_ADDRESS")?
            .parse::<Ipv4Addr>()
            .map_err(|_| TransferError::InvalidEnvironment("IP_ADDRESS is not a dotted quad".to_string()))?;

        match role.as_str() {
            "tracker" => {
                let total_peers: usize = read_var("TOTAL_PEERS")?
                    .parse()
                    .map_err(|_| TransferError::InvalidEnvironment("TOTAL_PEERS is not an integer".to_string()))?;
                Ok(Role::Tracker(TrackerConfig { ip_address, expected_confirmations: total_peers + 1 }))
            }
            "origin" => {
                let tracker_ip = read_ip("TRACKER_IP")?;
                Ok(Role::Origin(OriginConfig { ip_address, tracker_ip, targets: read_connections()? }))
            }
            "superpeer" => {
                let tracker_ip = read_ip("TRACKER_IP")?;
                let source_peer = read_var("SOURCE_PEER")?;
                let source_ip = read_ip("SOURCE_PEER_IP")?;
                Ok(Role::SuperPeer(SuperPeerConfig {
                    ip_address,
                    tracker_ip,
                    source_peer,
                    source_ip,
                    targets: read_connections()?,
                }))
            }
            "leaf" => {
                let tracker_ip = read_ip("TRACKER_IP")?;
                let source_peer = read_var("SUPER_PEER").or_else(|_| read_var("SOURCE_PEER"))?;
                let source_ip = std::env::var("SUPER_PEER_IP")
                    .or_else(|_| std::env::var("SOURCE_PEER_IP"))
                    .map_err(|_| TransferError::InvalidEnvironment("missing SUPER_PEER_IP/SOURCE_PEER_IP".to_string()))?
                    .parse::<Ipv4Addr>()
                    .map_err(|_| TransferError::InvalidEnvironment("source IP is not a dotted quad".to_string()))?;
                Ok(Role::Leaf(LeafConfig { ip_address, tracker_ip, source_peer, source_ip }))
            }
            other => Err(TransferError::InvalidEnvironment(format!("unknown ROLE {other:?}"))),
        }
    }
}

fn read_var(name: &str) -> TransferResult<String> {
    std::env::var(name).map_err(|_| TransferError::InvalidEnvironment(format!("missing {name}")))
}

fn read_ip(name: &str) -> TransferResult<Ipv4Addr> {
    read_var(name)?.parse().map_err(|_| TransferError::InvalidEnvironment(format!("{name} is not a dotted quad")))
}

fn read_connections() -> TransferResult<Vec<ConnectionInfo>> {
    let mut connections = Vec::new();
    for i in 1.. {
        let key = format!("CONNECTION_{i}");
        let Ok(raw) = std::env::var(&key) else { break };
        let parsed = ConnectionInfo::from_str(&raw)
            .map_err(|e| TransferError::InvalidEnvironment(format!("{key}: {e}")))?;
        connections.push(parsed);
    }
    Ok(connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // std::env is process-global; serialize tests that mutate it so they
    // don't interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn parses_origin_role_with_connections() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        std::env::set_var("ROLE", "origin");
        std::env::set_var("IP_ADDRESS", "10.200.0.2");
        std::env::set_var("TRACKER_IP", "10.200.0.254");
        std::env::set_var("CONNECTION_1", "veth0:10.101.0.2,1:10.101.0.3");
        std::env::remove_var("CONNECTION_2");

        let role = Role::from_env().unwrap();
        match role {
            Role::Origin(cfg) => {
                assert_eq!(cfg.ip_address, Ipv4Addr::new(10, 200, 0, 2));
                assert_eq!(cfg.tracker_ip, Ipv4Addr::new(10, 200, 0, 254));
                assert_eq!(cfg.targets.len(), 1);
            }
            _ => panic!("expected Origin role"),
        }

        std::env::remove_var("ROLE");
        std::env::remove_var("IP_ADDRESS");
        std::env::remove_var("TRACKER_IP");
        std::env::remove_var("CONNECTION_1");
    }

    #[test]
    fn missing_role_is_reported_as_invalid_environment() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        std::env::remove_var("ROLE");
        assert!(Role::from_env().is_err());
    }
}
