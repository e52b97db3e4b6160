//! Graph partitioner collaborator for the two-tier overlay
//!
//! The two-tier overlay variant is produced by an external collaborator: a
//! graph partitioner that, given peers and their capacities, returns a
//! mapping `superpeer -> {leaves}` covering every non-origin peer exactly
//! once, plus the list of super-peers connected directly to origin. The
//! Planner only validates and accepts this mapping (see
//! [`crate::overlay::Overlay::two_tier`]).

use meshbench_sampler::Peer;
use std::collections::BTreeMap;

/// A proposed two-tier overlay mapping from super-peer name to its leaves.
#[derive(Debug, Clone, Default)]
pub struct PartitionPlan {
    /// Super-peer name -> ordered list of leaf names it serves.
    pub superpeer_leaves: BTreeMap<String, Vec<String>>,
}

/// External collaborator contract for partitioning non-origin peers into
/// super-peer groups for the two-tier overlay.
pub trait GraphPartitioner {
    /// Partition `peers` (which must exclude `origin`) into super-peer
    /// groups. `superpeer_count` requests how many super-peers to select;
    /// the partitioner may return fewer if `peers` is too small to satisfy
    /// "every super-peer has at least one leaf".
    fn partition(&self, peers: &[Peer], superpeer_count: usize) -> PartitionPlan;
}

/// Reference partitioner: sorts leaves by descending `max_download` and
/// greedily assigns each to the super-peer with the fewest leaves so far
/// (round-robin tie-break), after picking the `superpeer_count` peers with
/// the highest `max_upload` as super-peers.
///
/// This is the harness's in-process stand-in for an external partitioning
/// service; it is swappable via the [`GraphPartitioner`] trait.
pub struct CapacityWeightedPartitioner;

impl GraphPartitioner for CapacityWeightedPartitioner {
    fn partition(&self, peers: &[Peer], superpeer_count: usize) -> PartitionPlan {
        let mut plan = PartitionPlan::default();
        if peers.is_empty() || superpeer_count == 0 {
            return plan;
        }

        let mut by_upload: Vec<&Peer> = peers.iter().collect();
        by_upload.sort_by(|a, b| b.max_upload.cmp(&a.max_upload).then_with(|| a.name.cmp(&b.name)));
        let superpeer_count = superpeer_count.min(peers.len());
        let superpeers: Vec<&Peer> = by_upload[..superpeer_count].to_vec();
        let superpeer_names: std::collections::HashSet<&str> =
            superpeers.iter().map(|p| p.name.as_str()).collect();

        for sp in &superpeers {
            plan.superpeer_leaves.insert(sp.name.clone(), Vec::new());
        }

        let mut leaves: Vec<&Peer> = peers.iter().filter(|p| !superpeer_names.contains(p.name.as_str())).collect();
        leaves.sort_by(|a, b| b.max_download.cmp(&a.max_download).then_with(|| a.name.cmp(&b.name)));

        let superpeer_order: Vec<String> = superpeers.iter().map(|p| p.name.clone()).collect();
        for (i, leaf) in leaves.into_iter().enumerate() {
            let sp = &superpeer_order[i % superpeer_order.len()];
            plan.superpeer_leaves.get_mut(sp).unwrap().push(leaf.name.clone());
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str, up: u32, down: u32) -> Peer {
        Peer::new(name, up, down, 20.0, 0.001)
    }

    #[test]
    fn every_leaf_assigned_exactly_once() {
        let peers: Vec<Peer> = (1..=10).map(|i| peer(&i.to_string(), 1000 + i as u32, 9000 + i as u32)).collect();
        let plan = CapacityWeightedPartitioner.partition(&peers, 3);

        assert_eq!(plan.superpeer_leaves.len(), 3);
        let mut all_leaves: Vec<&String> = plan.superpeer_leaves.values().flatten().collect();
        all_leaves.sort();
        let superpeer_names: std::collections::HashSet<&String> = plan.superpeer_leaves.keys().collect();
        let expected: Vec<String> = peers
            .iter()
            .map(|p| p.name.clone())
            .filter(|n| !superpeer_names.contains(n))
            .collect();
        let mut expected = expected;
        expected.sort();
        assert_eq!(all_leaves.into_iter().cloned().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn every_superpeer_gets_at_least_one_leaf_when_leaves_outnumber_superpeers() {
        let peers: Vec<Peer> = (1..=8).map(|i| peer(&i.to_string(), 1000 + i as u32, 9000 + i as u32)).collect();
        let plan = CapacityWeightedPartitioner.partition(&peers, 2);
        for leaves in plan.superpeer_leaves.values() {
            assert!(!leaves.is_empty());
        }
    }
}
