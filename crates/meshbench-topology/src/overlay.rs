//! Overlay selection: star or two-tier dissemination subgraph

use crate::catalog::Topology;
use crate::edge::Edge;
use crate::error::{TopologyError, TopologyResult};
use crate::partition::GraphPartitioner;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// The dissemination variant selected for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlayVariant {
    Star,
    TwoTier,
}

/// The subset of catalog edges actually used for dissemination.
///
/// Invariants: every non-origin peer is reachable from `origin` by exactly
/// one overlay path of length <= 2; every super-peer has at least one leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overlay {
    pub variant: OverlayVariant,
    pub edges: Vec<Edge>,
    /// Names of peers acting as super-peers (empty for the star variant).
    pub superpeers: Vec<String>,
}

impl Overlay {
    /// Build the star overlay: one edge `(origin, p)` for every non-origin
    /// peer `p`.
    pub fn star(topology: &Topology) -> Self {
        let origin = topology.origin().name.clone();
        let edges = topology
            .non_origin_peers()
            .map(|p| topology.edge(&origin, &p.name).expect("catalog covers every ordered pair").clone())
            .collect();
        Self { variant: OverlayVariant::Star, edges, superpeers: Vec::new() }
    }

    /// Build the two-tier overlay using `partitioner` to assign leaves to
    /// `superpeer_count` super-peers, then validate the result against the
    /// overlay invariants.
    pub fn two_tier(
        topology: &Topology,
        partitioner: &dyn GraphPartitioner,
        superpeer_count: usize,
    ) -> TopologyResult<Self> {
        let origin = topology.origin().name.clone();
        let non_origin: Vec<_> = topology.non_origin_peers().cloned().collect();

        let plan = partitioner.partition(&non_origin, superpeer_count);

        let mut edges = Vec::new();
        let mut superpeers = Vec::new();
        let mut covered: HashSet<String> = HashSet::new();

        for (superpeer, leaves) in &plan.superpeer_leaves {
            if leaves.is_empty() {
                return Err(TopologyError::OverlayInvalid(format!(
                    "super-peer {superpeer} has no leaves"
                )));
            }
            edges.push(
                topology
                    .edge(&origin, superpeer)
                    .ok_or_else(|| TopologyError::OverlayInvalid(format!("unknown super-peer {superpeer}")))?
                    .clone(),
            );
            superpeers.push(superpeer.clone());
            if !covered.insert(superpeer.clone()) {
                return Err(TopologyError::OverlayInvalid(format!("super-peer {superpeer} covered twice")));
            }

            for leaf in leaves {
                edges.push(
                    topology
                        .edge(superpeer, leaf)
                        .ok_or_else(|| TopologyError::OverlayInvalid(format!("unknown leaf {leaf}")))?
                        .clone(),
                );
                if !covered.insert(leaf.clone()) {
                    return Err(TopologyError::OverlayInvalid(format!("peer {leaf} covered twice")));
                }
            }
        }

        let expected: HashSet<String> = non_origin.iter().map(|p| p.name.clone()).collect();
        if covered != expected {
            let missing: Vec<_> = expected.difference(&covered).cloned().collect();
            return Err(TopologyError::OverlayInvalid(format!(
                "overlay does not cover every non-origin peer exactly once; missing {missing:?}"
            )));
        }

        debug!(superpeers = superpeers.len(), edges = edges.len(), "built two-tier overlay");
        Ok(Self { variant: OverlayVariant::TwoTier, edges, superpeers })
    }

    /// Map of source peer name -> ordered overlay targets, in the order
    /// edges were emitted (used by the bandwidth allocator's tie-break
    /// rule).
    pub fn targets_by_source(&self) -> HashMap<&str, Vec<&str>> {
        let mut map: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in &self.edges {
            map.entry(edge.source.as_str()).or_default().push(edge.target.as_str());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::CapacityWeightedPartitioner;
    use meshbench_sampler::{Peer, ORIGIN_NAME};

    fn catalog(n: usize) -> Topology {
        let mut peers = vec![Peer::new(ORIGIN_NAME, 25_000, 78_000, 40.20, 0.0024)];
        for i in 1..=n {
            peers.push(Peer::new(i.to_string(), 800 + i as u32 * 5, 9_500 + i as u32 * 5, 20.0, 0.001));
        }
        Topology::build_catalog(peers).unwrap()
    }

    #[test]
    fn star_overlay_has_one_edge_per_non_origin_peer_scenario_s3() {
        // S1: N=5 total peers (origin + 4 leaves) -> catalog has 5*4=20 edges,
        // star overlay has 4 overlay edges.
        let topology = catalog(4);
        assert_eq!(topology.edges.len(), 20);
        let overlay = Overlay::star(&topology);
        assert_eq!(overlay.edges.len(), 4);
        assert!(overlay.superpeers.is_empty());
    }

    #[test]
    fn two_tier_overlay_covers_every_peer_exactly_once() {
        let topology = catalog(12);
        let overlay = Overlay::two_tier(&topology, &CapacityWeightedPartitioner, 3).unwrap();
        assert_eq!(overlay.superpeers.len(), 3);

        let mut covered = HashSet::new();
        for edge in &overlay.edges {
            if edge.source != "origin" {
                assert!(overlay.superpeers.contains(&edge.source));
            }
            covered.insert(edge.target.clone());
        }
        let expected: HashSet<String> = topology.non_origin_peers().map(|p| p.name.clone()).collect();
        assert_eq!(covered, expected);
    }
}
