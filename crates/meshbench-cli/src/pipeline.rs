//! Orchestration: wires Sampler -> Topology -> Fabric Builder -> Transfer
//! Orchestrator -> Validator behind the `plan`/`run`/`validate` subcommands.
//!
//! The container runtime and shaping mechanism are external collaborators
//! out of scope (§1); this crate drives them through their trait seams
//! using the single-host reference implementations
//! (`LocalProcessRuntime`, `NoopShapingApplier`, `TcpEdgeProbe`) shipped
//! alongside those seams. A real namespace-backed deployment would swap
//! in its own implementations without touching anything below.

use crate::cli::PlanArgs;
use crate::config::{run_dir, MeshBenchConfig};
use crate::display::{format_bytes, format_duration_secs, print_box_header, print_info, print_separator, print_success, print_warning};
use crate::results::{append_record, next_test_id, ResultRecord, TimingStats};
use anyhow::{bail, Context, Result};
use meshbench_fabric::{ContainerRuntime, FabricBuilder, FabricDescription, LocalProcessRuntime, NoopShapingApplier, ShapingApplier};
use meshbench_sampler::Sampler;
use meshbench_topology::{allocate, AllocatedEdge, CapacityWeightedPartitioner, Overlay, Topology};
use meshbench_validator::{aggregate, hash_file, run_echo_server, run_throughput_server, validate_all, verify_endpoint, EdgeProbe, TcpEdgeProbe};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Everything a plan needs to be rebuilt into a fabric, or reloaded for
/// `validate`, persisted as a single JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedPlan {
    pub test_id: u64,
    pub seed: u64,
    pub peer_count: usize,
    pub file_size_bytes: u64,
    pub fabric_name: String,
    pub fabric_prefix: String,
    pub topology: Topology,
    pub overlay: Overlay,
    pub allocated: Vec<AllocatedEdge>,
}

impl PersistedPlan {
    pub fn path(test_id: u64) -> PathBuf {
        run_dir(test_id).join("plan.json")
    }

    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(run_dir(self.test_id))?;
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(self.test_id), text)?;
        Ok(())
    }

    pub fn load(test_id: u64) -> Result<Self> {
        let text = std::fs::read_to_string(Self::path(test_id))
            .with_context(|| format!("no persisted plan for test_id {test_id}; run `meshbench plan` or `meshbench run` first"))?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Sample a population and compute its overlay/allocation, applying any
/// CLI overrides over the loaded config.
pub fn build_plan(cfg: &MeshBenchConfig, args: &PlanArgs, test_id: u64) -> Result<PersistedPlan> {
    let peer_count = args.peers.unwrap_or(cfg.peer_count);
    let seed = args.seed.unwrap_or(cfg.seed);
    let file_size_bytes = args.file_size.unwrap_or(cfg.file_size_bytes);
    let uses_two_tier = args.two_tier || cfg.uses_two_tier;
    let superpeer_count = args.superpeers.unwrap_or(cfg.superpeer_count);

    let mut sampler = Sampler::new(seed);
    let mut peers = sampler.sample_peers(peer_count).context("sampling peer population")?;
    peers.insert(0, sampler.sample_origin());

    let topology = Topology::build_catalog(peers.clone()).context("building full-mesh catalog")?;

    let overlay = if uses_two_tier {
        Overlay::two_tier(&topology, &CapacityWeightedPartitioner, superpeer_count).context("building two-tier overlay")?
    } else {
        Overlay::star(&topology)
    };

    let allocated = allocate(&overlay, &peers).context("allocating overlay bandwidth")?;

    Ok(PersistedPlan {
        test_id,
        seed,
        peer_count,
        file_size_bytes,
        fabric_name: cfg.fabric_name.clone(),
        fabric_prefix: cfg.fabric_prefix.clone(),
        topology,
        overlay,
        allocated,
    })
}

fn print_plan_summary(plan: &PersistedPlan) {
    print_box_header(&format!("meshbench plan #{}", plan.test_id));
    println!("  peers (non-origin): {}", plan.peer_count);
    println!("  seed:               {}", plan.seed);
    println!("  overlay:            {:?}", plan.overlay.variant);
    if !plan.overlay.superpeers.is_empty() {
        println!("  super-peers:        {}", plan.overlay.superpeers.join(", "));
    }
    println!("  artifact size:      {}", format_bytes(plan.file_size_bytes));
    print_separator();
    println!("  {:<10} {:<10} {:>12} {:>12}", "source", "target", "bandwidth", "allocated");
    for edge in &plan.allocated {
        println!("  {:<10} {:<10} {:>9}kbps {:>9}kbps", edge.source, edge.target, edge.bandwidth, edge.allocated_bandwidth);
    }
    print_separator();
}

pub fn cmd_plan(cfg: &MeshBenchConfig, args: &PlanArgs) -> Result<()> {
    let test_id = next_test_id()?;
    let plan = build_plan(cfg, args, test_id)?;
    print_plan_summary(&plan);

    if args.show_fabric {
        let builder = FabricBuilder::new(plan.fabric_name.clone(), plan.fabric_prefix.clone());
        let fabric_plan = builder.build(&plan.topology, &plan.overlay, &plan.allocated)?;
        println!("{}", fabric_plan.description.to_yaml()?);
    }

    plan.save()?;
    print_info(&format!("plan persisted to {}", PersistedPlan::path(test_id).display()));
    Ok(())
}

/// Generate a deterministic synthetic artifact of `size` bytes for the
/// origin to serve. Content doesn't matter, only that every peer's copy
/// hashes identically to this one.
fn synthetic_artifact(size: u64) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

pub async fn cmd_run(cfg: &MeshBenchConfig, args: &PlanArgs) -> Result<()> {
    let test_id = next_test_id()?;
    let plan = build_plan(cfg, args, test_id)?;
    print_plan_summary(&plan);
    plan.save()?;

    let builder = FabricBuilder::new(plan.fabric_name.clone(), plan.fabric_prefix.clone());
    let fabric_plan = builder.build(&plan.topology, &plan.overlay, &plan.allocated).context("building fabric description")?;

    let run_root = run_dir(test_id);
    let endpoints_root = run_root.join("endpoints");
    std::fs::write(run_root.join("fabric.yaml"), fabric_plan.description.to_yaml()?)?;
    std::fs::write(run_root.join("connection-details.json"), &fabric_plan.allocated_edge_artifact_json)?;

    let mut description: FabricDescription = fabric_plan.description.clone();
    for (name, node) in description.topology.nodes.iter_mut() {
        let working_dir = endpoints_root.join(name);
        std::fs::create_dir_all(&working_dir)?;
        node.env.insert("MESHBENCH_WORKDIR".to_string(), working_dir.display().to_string());
    }

    let origin_dir = endpoints_root.join("origin");
    std::fs::create_dir_all(&origin_dir)?;
    std::fs::write(meshbench_transfer::origin_artifact_path(&origin_dir), synthetic_artifact(plan.file_size_bytes))?;

    let shaping = NoopShapingApplier;
    for name in description.topology.nodes.keys() {
        shaping.apply(name).await.context("applying shaping")?;
    }

    let endpoint_binary = cfg.resolve_endpoint_binary()?;
    if !endpoint_binary.exists() {
        bail!(
            "meshbench-endpoint binary not found at {} (build the workspace so it's a sibling of meshbench, or set endpoint_binary in the config)",
            endpoint_binary.display()
        );
    }
    let runtime = LocalProcessRuntime::new(endpoint_binary);

    info!(endpoints = description.topology.nodes.len(), "launching fabric endpoints");
    let mut handles = runtime.launch(&description).await.context("launching fabric endpoints")?;

    let deadline = cfg.run_deadline();
    let run_started = std::time::Instant::now();
    let join_all = async {
        for handle in &mut handles {
            let _ = handle.wait().await;
        }
    };
    if tokio::time::timeout(deadline, join_all).await.is_err() {
        warn!(?deadline, "run deadline elapsed, killing any remaining endpoints");
        for handle in &mut handles {
            handle.kill().await;
        }
        bail!("run deadline of {:?} elapsed before every endpoint confirmed completion", deadline);
    }
    let run_elapsed = run_started.elapsed();
    print_success(&format!("all {} endpoints completed in {}", handles.len(), format_duration_secs(run_elapsed.as_secs_f64())));

    let origin_hash = hash_file(&meshbench_transfer::origin_artifact_path(&origin_dir)).await?;
    let mut hash_match = true;
    let mut connection_ms = Vec::new();
    let mut transfer_ms = Vec::new();
    let mut total_ms = Vec::new();

    for peer in plan.topology.non_origin_peers() {
        let source_peer = plan
            .overlay
            .edges
            .iter()
            .find(|e| e.target == peer.name)
            .map(|e| e.source.clone())
            .unwrap_or_else(|| "origin".to_string());
        let working_dir = endpoints_root.join(&peer.name);

        match verify_endpoint(&peer.name, &working_dir, &source_peer, &origin_hash).await {
            Ok(()) => {}
            Err(error) => {
                hash_match = false;
                warn!(peer = peer.name.as_str(), %error, "integrity check failed");
            }
        }

        if let Some(measurement) = read_measurement(&working_dir) {
            connection_ms.push(measurement.connection_duration_ms);
            transfer_ms.push(measurement.file_transfer_duration_ms);
            total_ms.push(measurement.total_duration_ms);
        }
    }

    if hash_match {
        print_success("every endpoint's received artifact matches the origin hash");
    } else {
        print_warning("one or more endpoints failed the integrity check");
    }

    let (validations, failures) = simulate_edge_validation(&plan.allocated).await?;
    for failure in &failures {
        warn!(%failure, "edge validation failed");
    }
    let (bw_stats, lat_stats) = aggregate(&validations).map(|(bw, lat)| (Some(bw), Some(lat))).unwrap_or((None, None));
    let bandwidth_values: Vec<f64> = plan.allocated.iter().map(|e| e.allocated_bandwidth as f64).collect();

    let record = ResultRecord::new(
        test_id,
        plan.peer_count,
        plan.overlay.variant,
        plan.file_size_bytes,
        TimingStats::from_values(&bandwidth_values),
        lat_stats,
        bw_stats,
        TimingStats::from_values(&connection_ms),
        TimingStats::from_values(&transfer_ms),
        TimingStats::from_values(&total_ms),
        hash_match,
    );
    append_record(&record)?;
    print_info(&format!("result recorded as test_id {test_id}"));

    if !hash_match {
        bail!("integrity check failed: hash mismatch for one or more endpoints in test_id {test_id}");
    }
    Ok(())
}

pub async fn cmd_validate(test_id: u64) -> Result<()> {
    let plan = PersistedPlan::load(test_id)?;
    let (validations, failures) = simulate_edge_validation(&plan.allocated).await?;

    print_box_header(&format!("meshbench validate #{test_id}"));
    println!("  edges passed:  {}", validations.len());
    println!("  edges failed:  {}", failures.len());
    if let Some((bw, lat)) = aggregate(&validations) {
        println!("  bandwidth error  min/avg/max: {:.2}% / {:.2}% / {:.2}%", bw.min, bw.mean, bw.max);
        println!("  latency error    min/avg/max: {:.2}% / {:.2}% / {:.2}%", lat.min, lat.mean, lat.max);
    }
    for failure in &failures {
        print_warning(&failure.to_string());
    }
    print_separator();

    if failures.is_empty() {
        Ok(())
    } else {
        bail!("{} edge(s) failed validation", failures.len());
    }
}

/// Validate every allocated edge against a loopback stand-in: an echo
/// server and a throughput server spun up locally per edge. This
/// exercises the same probe/tolerance pipeline §4.5 specifies, but does
/// not observe real applied shaping -- there is no namespace-backed
/// runtime in this reference deployment for it to observe (§1's
/// container-runtime/shaping collaborators are out of scope).
async fn simulate_edge_validation(edges: &[AllocatedEdge]) -> Result<(Vec<meshbench_validator::EdgeValidation>, Vec<meshbench_validator::ValidatorError>)> {
    let probe = TcpEdgeProbe;
    let mut addrs_by_edge = Vec::with_capacity(edges.len());
    let mut servers = Vec::new();

    for _ in edges {
        let echo_listener = TcpListener::bind("127.0.0.1:0").await?;
        let echo_addr = echo_listener.local_addr()?;
        let throughput_listener = TcpListener::bind("127.0.0.1:0").await?;
        let throughput_addr = throughput_listener.local_addr()?;

        servers.push(tokio::spawn(async move {
            let _ = run_echo_server(echo_listener).await;
        }));
        servers.push(tokio::spawn(async move {
            let _ = run_throughput_server(throughput_listener).await;
        }));
        addrs_by_edge.push((echo_addr, throughput_addr));
    }

    let resolve = |edge: &AllocatedEdge| -> (SocketAddr, SocketAddr) {
        let index = edges.iter().position(|e| e.source == edge.source && e.target == edge.target).unwrap_or(0);
        addrs_by_edge[index]
    };

    let result = validate_all(&probe as &dyn EdgeProbe, edges, resolve).await;

    for server in servers {
        server.abort();
    }

    Ok(result)
}

/// Measurement an endpoint process writes to its working directory before
/// exiting, so the CLI's separate process can aggregate it (§4.4.1's
/// `ConnectionMeasurement` lives in the endpoint's own memory; this is the
/// file-based handoff between that process and the coordinator).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EndpointMeasurement {
    pub connection_duration_ms: f64,
    pub file_transfer_duration_ms: f64,
    pub total_duration_ms: f64,
}

fn read_measurement(working_dir: &Path) -> Option<EndpointMeasurement> {
    let text = std::fs::read_to_string(working_dir.join("measurement.json")).ok()?;
    serde_json::from_str(&text).ok()
}

pub fn cmd_results(last: Option<usize>) -> Result<()> {
    let records = crate::results::read_all()?;
    let start = last.map(|n| records.len().saturating_sub(n)).unwrap_or(0);

    print_box_header("meshbench results");
    println!(
        "  {:>8} {:>10} {:>9} {:>12} {:>10} {:>10} {:>6}",
        "test_id", "peers", "overlay", "size", "bw_avg", "total_avg", "hash"
    );
    for record in &records[start..] {
        println!(
            "  {:>8} {:>10} {:>9} {:>12} {:>9.0}k {:>9.1}ms {:>6}",
            record.test_id,
            record.peer_count,
            record.overlay_variant,
            format_bytes(record.artifact_size_bytes),
            record.bandwidth_avg_kbps,
            record.total_time_avg_ms,
            if record.hash_match { "ok" } else { "FAIL" },
        );
    }
    print_separator();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_plan_is_reproducible_for_a_fixed_seed() {
        let cfg = MeshBenchConfig::default();
        let args = PlanArgs { peers: Some(8), seed: Some(7), two_tier: false, superpeers: None, file_size: Some(1_000), show_fabric: false };
        let a = build_plan(&cfg, &args, 1).unwrap();
        let b = build_plan(&cfg, &args, 2).unwrap();
        assert_eq!(a.allocated.len(), b.allocated.len());
        assert_eq!(a.topology.peers, b.topology.peers);
    }

    #[test]
    fn synthetic_artifact_has_the_requested_length() {
        assert_eq!(synthetic_artifact(12_345).len(), 12_345);
    }
}
