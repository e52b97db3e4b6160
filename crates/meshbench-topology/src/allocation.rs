//! Two-pass fair-share bandwidth allocation

use crate::edge::Edge;
use crate::error::{TopologyError, TopologyResult};
use crate::overlay::Overlay;
use meshbench_sampler::Peer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// An overlay edge augmented with the bandwidth actually allocated to it.
///
/// Invariant per source peer S with overlay fanout K:
/// `sum(allocated_bandwidth(S, t) for t in targets(S)) <= S.max_upload`,
/// and for each target T, `allocated_bandwidth(S, T) <= T.max_download`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatedEdge {
    pub source: String,
    pub target: String,
    pub bandwidth: u32,
    pub latency: f64,
    pub loss: f64,
    /// Kbit/s, `<= edge.bandwidth`
    pub allocated_bandwidth: u32,
}

/// Run the two-pass fair-share allocator over every overlay edge, grouped
/// by source peer.
///
/// Pass 1 clamps any target whose download ceiling is below its naive
/// equal share; pass 2 redistributes the remaining budget evenly (floor
/// division) across the unassigned targets, in overlay emission order
/// (the tie-break rule for the degenerate `remaining_targets == 0` case).
pub fn allocate(overlay: &Overlay, peers: &[Peer]) -> TopologyResult<Vec<AllocatedEdge>> {
    let peers_by_name: HashMap<&str, &Peer> = peers.iter().map(|p| (p.name.as_str(), p)).collect();
    let targets_by_source = overlay.targets_by_source();

    let mut allocated = Vec::with_capacity(overlay.edges.len());

    for (&source_name, targets) in &targets_by_source {
        let source = peers_by_name.get(source_name).expect("overlay source must be a known peer");
        if source.max_upload == 0 {
            return Err(TopologyError::NoUplinkBudget(source_name.to_string()));
        }

        let k = targets.len() as u32;
        let share = source.max_upload / k;

        let mut alloc: HashMap<&str, u32> = HashMap::new();
        let mut remaining_budget = source.max_upload;
        let mut remaining_targets = k;

        // Pass 1: clamp by sink download ceiling.
        for &target_name in targets {
            let target = peers_by_name.get(target_name).expect("overlay target must be a known peer");
            if target.max_download < share {
                alloc.insert(target_name, target.max_download);
                remaining_budget = remaining_budget.saturating_sub(target.max_download);
                remaining_targets -= 1;
            }
        }

        // Pass 2: redistribute remaining budget evenly over unassigned targets.
        for &target_name in targets {
            if alloc.contains_key(target_name) {
                continue;
            }
            let target = peers_by_name.get(target_name).expect("overlay target must be a known peer");
            let even_share = if remaining_targets == 0 { 0 } else { remaining_budget / remaining_targets };
            alloc.insert(target_name, target.max_download.min(even_share));
        }

        let total: u32 = alloc.values().sum();
        if total > source.max_upload {
            return Err(TopologyError::OverAllocation {
                source: source_name.to_string(),
                allocated: total,
                budget: source.max_upload,
            });
        }

        for &target_name in targets {
            let edge = overlay
                .edges
                .iter()
                .find(|e| e.source == source_name && e.target == target_name)
                .expect("overlay edge must exist for every (source, target) pair");
            allocated.push(to_allocated_edge(edge, alloc[target_name]));
        }
    }

    debug!(allocated = allocated.len(), "bandwidth allocation complete");
    Ok(allocated)
}

fn to_allocated_edge(edge: &Edge, allocated_bandwidth: u32) -> AllocatedEdge {
    AllocatedEdge {
        source: edge.source.clone(),
        target: edge.target.clone(),
        bandwidth: edge.bandwidth,
        latency: edge.latency,
        loss: edge.loss,
        allocated_bandwidth,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Topology;
    use meshbench_sampler::ORIGIN_NAME;

    #[test]
    fn allocation_closure_holds_scenario_s1() {
        let peers = vec![
            Peer::new(ORIGIN_NAME, 25_000, 78_000, 40.20, 0.0024),
            Peer::new("1", 800, 9_500, 25.5, 0.0020),
        ];
        let topology = Topology::build_catalog(peers.clone()).unwrap();
        let overlay = Overlay::star(&topology);
        let allocated = allocate(&overlay, &peers).unwrap();

        assert_eq!(allocated.len(), 1);
        assert_eq!(allocated[0].allocated_bandwidth, 9_500);
    }

    #[test]
    fn allocation_clamp_scenario_s2() {
        let peers = vec![
            Peer::new(ORIGIN_NAME, 10_000, 78_000, 40.20, 0.0024),
            Peer::new("1", 800, 2_000, 20.0, 0.001),
            Peer::new("2", 800, 2_000, 20.0, 0.001),
            Peer::new("3", 800, 2_000, 20.0, 0.001),
            Peer::new("4", 800, 10_000, 20.0, 0.001),
        ];
        let topology = Topology::build_catalog(peers.clone()).unwrap();
        let overlay = Overlay::star(&topology);
        let allocated = allocate(&overlay, &peers).unwrap();

        let by_target: HashMap<&str, u32> =
            allocated.iter().map(|a| (a.target.as_str(), a.allocated_bandwidth)).collect();
        assert_eq!(by_target["1"], 2_000);
        assert_eq!(by_target["2"], 2_000);
        assert_eq!(by_target["3"], 2_000);
        assert_eq!(by_target["4"], 4_000);

        let total: u32 = allocated.iter().map(|a| a.allocated_bandwidth).sum();
        assert_eq!(total, 10_000);
    }

    #[test]
    fn allocation_closure_property_t1_holds_for_random_populations() {
        use meshbench_sampler::Sampler;

        for seed in 0..20u64 {
            let mut sampler = Sampler::new(seed);
            let mut peers = sampler.sample_peers(15).unwrap();
            peers.insert(0, sampler.sample_origin());
            let topology = Topology::build_catalog(peers.clone()).unwrap();
            let overlay = Overlay::star(&topology);
            let allocated = allocate(&overlay, &peers).unwrap();

            let origin = topology.origin();
            let total: u32 = allocated.iter().map(|a| a.allocated_bandwidth).sum();
            assert!(total <= origin.max_upload);

            let by_name: HashMap<&str, &Peer> = peers.iter().map(|p| (p.name.as_str(), p)).collect();
            for edge in &allocated {
                assert!(edge.allocated_bandwidth <= by_name[edge.target.as_str()].max_download);
            }
        }
    }
}
