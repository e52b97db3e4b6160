//! Configuration management for `meshbench`
//!
//! Config file lives at `~/.meshbench/config.yaml`. On first run a default
//! config is written and returned.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub fn meshbench_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".meshbench")
}

pub fn config_file() -> PathBuf {
    meshbench_dir().join("config.yaml")
}

/// Directory holding one subdirectory per `test_id` (fabric description,
/// allocated-edge artifact, persisted plan).
pub fn runs_dir() -> PathBuf {
    meshbench_dir().join("runs")
}

pub fn run_dir(test_id: u64) -> PathBuf {
    runs_dir().join(test_id.to_string())
}

/// Monotonic `test_id` counter file (§6 persisted state).
pub fn test_id_file() -> PathBuf {
    meshbench_dir().join("test_id")
}

/// Append-only results CSV (§6 persisted state, §3 Result Record).
pub fn results_file() -> PathBuf {
    meshbench_dir().join("results.csv")
}

/// Run-wide, reproducible configuration for one invocation of the harness.
///
/// Every value here is also overridable per-invocation from the CLI
/// (`plan`/`run` flags); the file only supplies defaults so repeated
/// local runs don't need to repeat every flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshBenchConfig {
    /// Non-origin peer count to sample.
    #[serde(default = "default_peer_count")]
    pub peer_count: usize,

    /// Sampler seed. A fixed default keeps `meshbench plan` reproducible
    /// out of the box; `--seed` overrides it per run.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Select the two-tier overlay instead of the star overlay.
    #[serde(default)]
    pub uses_two_tier: bool,

    /// Super-peer count, consulted only when `uses_two_tier` is set.
    #[serde(default = "default_superpeer_count")]
    pub superpeer_count: usize,

    /// Synthetic transfer artifact size, in bytes.
    #[serde(default = "default_file_size_bytes")]
    pub file_size_bytes: u64,

    /// Fabric name embedded in the topology description (§6).
    #[serde(default = "default_fabric_name")]
    pub fabric_name: String,

    /// Fabric prefix embedded in the topology description (§6).
    #[serde(default = "default_fabric_prefix")]
    pub fabric_prefix: String,

    /// Run-wide deadline, in seconds, proportional to peer count (§5);
    /// stored as a per-peer multiplier so it scales with `peer_count`.
    #[serde(default = "default_deadline_secs_per_peer")]
    pub deadline_secs_per_peer: u64,

    /// Path to the `meshbench-endpoint` binary the default
    /// `LocalProcessRuntime` spawns. Defaults to the sibling binary next
    /// to the running `meshbench` executable.
    #[serde(default)]
    pub endpoint_binary: Option<PathBuf>,
}

fn default_peer_count() -> usize {
    std::env::var("MESHBENCH_PEER_COUNT").ok().and_then(|s| s.parse().ok()).unwrap_or(10)
}
fn default_seed() -> u64 {
    std::env::var("MESHBENCH_SEED").ok().and_then(|s| s.parse().ok()).unwrap_or(42)
}
fn default_superpeer_count() -> usize {
    3
}
fn default_file_size_bytes() -> u64 {
    10_000_000
}
fn default_fabric_name() -> String {
    "meshbench".to_string()
}
fn default_fabric_prefix() -> String {
    "mb".to_string()
}
fn default_deadline_secs_per_peer() -> u64 {
    5
}

impl Default for MeshBenchConfig {
    fn default() -> Self {
        Self {
            peer_count: default_peer_count(),
            seed: default_seed(),
            uses_two_tier: false,
            superpeer_count: default_superpeer_count(),
            file_size_bytes: default_file_size_bytes(),
            fabric_name: default_fabric_name(),
            fabric_prefix: default_fabric_prefix(),
            deadline_secs_per_peer: default_deadline_secs_per_peer(),
            endpoint_binary: None,
        }
    }
}

impl MeshBenchConfig {
    /// Load config from `~/.meshbench/config.yaml`, creating it with
    /// defaults if absent.
    pub fn load_or_create() -> Result<Self> {
        let cfg_file = config_file();
        std::fs::create_dir_all(cfg_file.parent().unwrap())?;

        if cfg_file.exists() {
            let text = std::fs::read_to_string(&cfg_file).with_context(|| format!("reading {}", cfg_file.display()))?;
            let cfg: MeshBenchConfig =
                serde_yaml::from_str(&text).with_context(|| format!("parsing {}", cfg_file.display()))?;
            debug!(path = %cfg_file.display(), "loaded config");
            Ok(cfg)
        } else {
            let cfg = MeshBenchConfig::default();
            cfg.save()?;
            info!(path = %cfg_file.display(), "wrote default config");
            Ok(cfg)
        }
    }

    pub fn save(&self) -> Result<()> {
        let cfg_file = config_file();
        std::fs::create_dir_all(cfg_file.parent().unwrap())?;
        let text = serde_yaml::to_string(self).context("serializing config")?;
        std::fs::write(&cfg_file, text).with_context(|| format!("writing {}", cfg_file.display()))?;
        Ok(())
    }

    /// Resolve the `meshbench-endpoint` binary path: the configured
    /// override, or the sibling of the running executable.
    pub fn resolve_endpoint_binary(&self) -> Result<PathBuf> {
        if let Some(path) = &self.endpoint_binary {
            return Ok(path.clone());
        }
        let mut path = std::env::current_exe().context("locating current executable")?;
        path.set_file_name(if cfg!(windows) { "meshbench-endpoint.exe" } else { "meshbench-endpoint" });
        Ok(path)
    }

    /// Run-wide deadline (§5), proportional to peer count.
    pub fn run_deadline(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.deadline_secs_per_peer * (self.peer_count as u64 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_yaml() {
        let cfg = MeshBenchConfig::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: MeshBenchConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.peer_count, cfg.peer_count);
        assert_eq!(parsed.seed, cfg.seed);
    }

    #[test]
    fn run_deadline_scales_with_peer_count() {
        let mut cfg = MeshBenchConfig::default();
        cfg.peer_count = 10;
        cfg.deadline_secs_per_peer = 5;
        assert_eq!(cfg.run_deadline(), std::time::Duration::from_secs(55));
    }
}
