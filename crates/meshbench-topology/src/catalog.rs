//! Full-mesh edge catalog

use crate::edge::Edge;
use crate::error::{TopologyError, TopologyResult};
use meshbench_sampler::{Peer, ORIGIN_NAME};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An ordered sequence of peers plus the full set of derived edges between
/// every ordered pair.
///
/// Invariants: every ordered pair `(A, B)` with `A != B` has exactly one
/// edge; exactly one peer is `origin`; edges are deterministic functions of
/// endpoint attributes (see [`Edge::derive`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub peers: Vec<Peer>,
    pub edges: Vec<Edge>,
}

impl Topology {
    /// Build the full-mesh catalog from a peer population. `peers` must
    /// contain exactly one peer named `origin` plus at least one other peer.
    ///
    /// Output edges are sorted by `(source, target)` for a stable listing
    /// used as Fabric Builder input.
    pub fn build_catalog(peers: Vec<Peer>) -> TopologyResult<Self> {
        let origin_count = peers.iter().filter(|p| p.is_origin()).count();
        if origin_count != 1 || peers.len() < 2 {
            return Err(TopologyError::InsufficientPeers(peers.len()));
        }

        let mut edges = Vec::with_capacity(peers.len() * (peers.len() - 1));
        for source in &peers {
            for target in &peers {
                if source.name != target.name {
                    edges.push(Edge::derive(source, target));
                }
            }
        }
        edges.sort_by(|a, b| (a.source.as_str(), a.target.as_str()).cmp(&(b.source.as_str(), b.target.as_str())));

        debug!(peers = peers.len(), edges = edges.len(), "built full-mesh catalog");
        Ok(Self { peers, edges })
    }

    /// The single `origin` peer.
    pub fn origin(&self) -> &Peer {
        self.peers.iter().find(|p| p.is_origin()).expect("catalog invariant: exactly one origin")
    }

    /// All peers other than `origin`, in population order.
    pub fn non_origin_peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter().filter(|p| !p.is_origin())
    }

    /// Look up the derived edge from `source` to `target`, if both are
    /// distinct peers in this catalog.
    pub fn edge(&self, source: &str, target: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.source == source && e.target == target)
    }
}
