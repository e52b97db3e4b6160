//! Allocated-edge artifact (§6): the Planner's on-disk output, consumed by
//! the Fabric Builder (bound read-only into each endpoint as
//! `connection-details-N.json`) and by the Validator (expected values for
//! per-edge comparison).

use crate::allocation::AllocatedEdge;
use serde::{Deserialize, Serialize};

/// One allocated edge, serialized with the external schema's exact field
/// names and string-encoded decimal precision (not the internal `f64`
/// representation used elsewhere in this crate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedEdgeArtifact {
    #[serde(rename = "sourceName")]
    pub source_name: String,
    #[serde(rename = "targetName")]
    pub target_name: String,
    pub bandwidth: u32,
    /// Decimal string, 2 fractional digits, e.g. `"65.70"`.
    pub latency: String,
    /// Decimal string, 4 fractional digits, e.g. `"0.0024"`.
    pub loss: String,
}

impl From<&AllocatedEdge> for AllocatedEdgeArtifact {
    fn from(edge: &AllocatedEdge) -> Self {
        Self {
            source_name: edge.source.clone(),
            target_name: edge.target.clone(),
            bandwidth: edge.allocated_bandwidth,
            latency: format!("{:.2}", edge.latency),
            loss: format!("{:.4}", edge.loss),
        }
    }
}

impl AllocatedEdgeArtifact {
    /// Render the full allocated-edge list as the §6 JSON array.
    pub fn to_json_array(edges: &[AllocatedEdge]) -> serde_json::Result<String> {
        let artifacts: Vec<AllocatedEdgeArtifact> = edges.iter().map(AllocatedEdgeArtifact::from).collect();
        serde_json::to_string_pretty(&artifacts)
    }

    /// Parse the numeric latency back out of its decimal-string encoding,
    /// as the Validator needs to compare against a measured `f64`.
    pub fn latency_ms(&self) -> f64 {
        self.latency.parse().expect("latency artifact field is always a valid decimal string")
    }

    /// Parse the numeric loss fraction back out of its decimal-string
    /// encoding.
    pub fn loss_fraction(&self) -> f64 {
        self.loss.parse().expect("loss artifact field is always a valid decimal string")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fixed_decimal_precision() {
        let edge = AllocatedEdge {
            source: "origin".to_string(),
            target: "1".to_string(),
            bandwidth: 9_500,
            latency: 65.7,
            loss: 0.0024,
            allocated_bandwidth: 9_500,
        };
        let artifact = AllocatedEdgeArtifact::from(&edge);
        assert_eq!(artifact.latency, "65.70");
        assert_eq!(artifact.loss, "0.0024");
        assert_eq!(artifact.source_name, "origin");
    }

    #[test]
    fn json_array_round_trips_through_serde() {
        let edges = vec![AllocatedEdge {
            source: "origin".to_string(),
            target: "1".to_string(),
            bandwidth: 9_500,
            latency: 65.7,
            loss: 0.0024,
            allocated_bandwidth: 9_500,
        }];
        let json = AllocatedEdgeArtifact::to_json_array(&edges).unwrap();
        let parsed: Vec<AllocatedEdgeArtifact> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].latency_ms(), 65.70);
        assert_eq!(parsed[0].loss_fraction(), 0.0024);
    }
}
