//! Declarative fabric description (§6)
//!
//! The YAML document handed to the container runtime collaborator. Field
//! names mirror the external schema exactly (kebab-case where the schema
//! specifies it) since this is the wire contract to an out-of-scope
//! runtime, not an internal type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MgmtNetwork {
    pub network: String,
    #[serde(rename = "ipv4-subnet")]
    pub ipv4_subnet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: String,
    pub image: String,
    #[serde(rename = "mgmt-ipv4")]
    pub mgmt_ipv4: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Host path -> container path read-only bind mounts, e.g. the
    /// `connection-details-N.json` Planner artifact.
    #[serde(default)]
    pub binds: Vec<String>,
    /// Path to the post-start shaping script, run once the endpoint's
    /// virtual interfaces are up.
    #[serde(default)]
    pub exec: Option<String>,
    pub cmd: Vec<String>,
    #[serde(default)]
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEndpoints {
    pub endpoints: [String; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TopologySection {
    pub nodes: BTreeMap<String, Node>,
    pub links: Vec<LinkEndpoints>,
}

/// Top-level fabric description document (§6's YAML schema).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricDescription {
    pub name: String,
    pub prefix: String,
    pub mgmt: MgmtNetwork,
    pub topology: TopologySection,
}

impl FabricDescription {
    pub fn to_yaml(&self) -> serde_yaml::Result<String> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_the_schema_s_field_names() {
        let description = FabricDescription {
            name: "meshbench".to_string(),
            prefix: "mb".to_string(),
            mgmt: MgmtNetwork { network: "mgmt0".to_string(), ipv4_subnet: "10.200.0.0/24".to_string() },
            topology: TopologySection::default(),
        };
        let yaml = description.to_yaml().unwrap();
        assert!(yaml.contains("ipv4-subnet: 10.200.0.0/24"));
        assert!(yaml.contains("name: meshbench"));
    }
}
