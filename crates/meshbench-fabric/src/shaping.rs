//! Shaping script rendering (§4.3 shaping script contract)
//!
//! The script itself is executed by the external [`crate::runtime::ShapingApplier`]
//! collaborator; this module only renders its *content* from an endpoint's
//! outbound connections, matching the contract: a priority queueing
//! discipline on the local interface, with a `netem` discipline per class
//! enforcing `delay`, `loss`, and `rate` toward each peer IP.

use crate::connection::ConnectionInfo;
use std::fmt::Write as _;
use meshbench_topology::AllocatedEdge;

/// Render the shaping script for one endpoint's outbound connections.
/// `connections` and `edges` must be the same length and pairwise
/// correspond (edge `i`'s applied values shape connection `i`'s interface).
pub fn render_shaping_script(connections: &[ConnectionInfo], edges: &[AllocatedEdge]) -> String {
    let mut script = String::from("#!/bin/sh\nset -e\n");
    for (connection, edge) in connections.iter().zip(edges) {
        let iface = &connection.iface;
        let _ = writeln!(script, "tc qdisc add dev {iface} root handle 1: prio");
        let _ = writeln!(
            script,
            "tc qdisc add dev {iface} parent 1:3 handle 30: netem delay {latency}ms loss {loss}% rate {bandwidth}kbit",
            latency = edge.latency,
            loss = edge.loss * 100.0,
            bandwidth = edge.allocated_bandwidth,
        );
        let _ = writeln!(
            script,
            "tc filter add dev {iface} protocol ip parent 1:0 prio 3 u32 match ip dst {target_ip} flowid 1:3",
            target_ip = connection.target_ip,
        );
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn renders_one_netem_block_per_connection() {
        let connections = vec![ConnectionInfo::new(
            "veth0",
            Ipv4Addr::new(10, 101, 0, 2),
            "1",
            Ipv4Addr::new(10, 101, 0, 3),
        )];
        let edges = vec![AllocatedEdge {
            source: "origin".to_string(),
            target: "1".to_string(),
            bandwidth: 9_500,
            latency: 65.7,
            loss: 0.0024,
            allocated_bandwidth: 9_500,
        }];
        let script = render_shaping_script(&connections, &edges);
        assert!(script.contains("dev veth0"));
        assert!(script.contains("delay 65.7ms"));
        assert!(script.contains("rate 9500kbit"));
        assert!(script.contains("match ip dst 10.101.0.3"));
    }
}
