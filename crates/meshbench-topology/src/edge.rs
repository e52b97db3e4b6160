//! Edge derivation

use meshbench_sampler::Peer;
use serde::{Deserialize, Serialize};

/// A directed edge between two peers, derived deterministically from their
/// attributes. This is the *theoretical* capacity; see [`crate::allocation`]
/// for the allocated bandwidth actually enforced on an overlay edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    /// Kbit/s, `min(source.max_upload, target.max_download)`
    pub bandwidth: u32,
    /// ms, `source.latency + target.latency`
    pub latency: f64,
    /// fraction, `max(source.loss, target.loss)`
    pub loss: f64,
}

impl Edge {
    /// Derive the edge from `source` to `target` per the data-model
    /// derivation rule. Panics if `source.name == target.name`: every
    /// caller in this crate only ever derives edges between distinct
    /// peers, so this is an internal contract, not a user-facing check.
    pub fn derive(source: &Peer, target: &Peer) -> Self {
        assert_ne!(source.name, target.name, "edge source and target must differ");
        Self {
            source: source.name.clone(),
            target: target.name.clone(),
            bandwidth: source.max_upload.min(target.max_download),
            latency: source.latency + target.latency,
            loss: source.loss.max(target.loss),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_matches_scenario_s1() {
        let origin = Peer::new("origin", 25_000, 78_000, 40.20, 0.0024);
        let p1 = Peer::new("1", 800, 9_500, 25.5, 0.0020);

        let edge = Edge::derive(&origin, &p1);
        assert_eq!(edge.bandwidth, 9_500);
        assert!((edge.latency - 65.70).abs() < 1e-9);
        assert_eq!(edge.loss, 0.0024);
    }
}
