//! `CONNECTION_<i>` record encoding and parsing
//!
//! Design Notes §9 replaces the source's duck-typed, string-split
//! `ConnectionInfo` with an explicit record and a parser that returns a
//! typed error on malformed input rather than propagating a silently wrong
//! value.

use crate::error::{FabricError, FabricResult};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// One outbound overlay edge from an endpoint's point of view, as encoded
/// in a `CONNECTION_<i>` environment variable:
/// `<iface>:<localIp>,<target>:<targetIp>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub iface: String,
    pub local_ip: Ipv4Addr,
    pub target_peer: String,
    pub target_ip: Ipv4Addr,
}

impl ConnectionInfo {
    pub fn new(
        iface: impl Into<String>,
        local_ip: Ipv4Addr,
        target_peer: impl Into<String>,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self { iface: iface.into(), local_ip, target_peer: target_peer.into(), target_ip }
    }

    /// Encode as the `CONNECTION_<i>` environment value.
    pub fn encode(&self) -> String {
        format!("{}:{},{}:{}", self.iface, self.local_ip, self.target_peer, self.target_ip)
    }
}

impl FromStr for ConnectionInfo {
    type Err = FabricError;

    fn from_str(raw: &str) -> FabricResult<Self> {
        let malformed = |reason: &'static str| FabricError::MalformedConnection { raw: raw.to_string(), reason };

        let (iface_part, target_part) = raw.split_once(',').ok_or_else(|| malformed("missing ',' separating iface from target"))?;

        let (iface, local_ip) = iface_part.split_once(':').ok_or_else(|| malformed("missing ':' in iface segment"))?;
        let (target_peer, target_ip) = target_part.split_once(':').ok_or_else(|| malformed("missing ':' in target segment"))?;

        if iface.is_empty() || target_peer.is_empty() {
            return Err(malformed("iface or target name is empty"));
        }

        let local_ip: Ipv4Addr = local_ip.parse().map_err(|_| malformed("local IP is not a dotted quad"))?;
        let target_ip: Ipv4Addr = target_ip.parse().map_err(|_| malformed("target IP is not a dotted quad"))?;

        Ok(ConnectionInfo {
            iface: iface.to_string(),
            local_ip,
            target_peer: target_peer.to_string(),
            target_ip,
        })
    }
}
