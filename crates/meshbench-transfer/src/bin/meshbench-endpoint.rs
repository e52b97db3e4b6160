//! Binary entry point for one fabric endpoint. The container runtime
//! launches one of these per node (§4.3); it reads its role from the
//! environment and runs until its role's work is done.

use meshbench_transfer::{run_role, run_tracker, tracker_socket_addr, ConnectionMeasurement, Role};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_WORKDIR: &str = "/app";

/// Writes this endpoint's timing measurement to its working directory so
/// a coordinator process running every endpoint as a local child (rather
/// than a fleet of namespace-isolated containers it can introspect
/// directly) can aggregate it after the process exits.
fn write_measurement(working_dir: &Path, measurement: ConnectionMeasurement) {
    let payload = serde_json::json!({
        "connection_duration_ms": measurement.connection_duration.as_secs_f64() * 1000.0,
        "file_transfer_duration_ms": measurement.file_transfer_duration.as_secs_f64() * 1000.0,
        "total_duration_ms": measurement.total_duration.as_secs_f64() * 1000.0,
    });
    if let Ok(text) = serde_json::to_string(&payload) {
        let _ = std::fs::write(working_dir.join("measurement.json"), text);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let role = match Role::from_env() {
        Ok(role) => role,
        Err(error) => {
            eprintln!("meshbench-endpoint: {error}");
            std::process::exit(2);
        }
    };

    let working_dir = std::env::var("MESHBENCH_WORKDIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_WORKDIR));

    let result = match role {
        Role::Tracker(cfg) => {
            let bind_addr = tracker_socket_addr(cfg.ip_address);
            run_tracker(bind_addr, cfg.expected_confirmations, Duration::from_secs(24 * 3600)).await.map(|_| ())
        }
        other => {
            // The Fabric Builder's shaping script runs as part of this
            // endpoint's launch sequence, ahead of `cmd`, so by the time
            // this process starts, shaping is already applied: the
            // barrier resolves immediately rather than waiting.
            let (tx, rx) = tokio::sync::oneshot::channel();
            let _ = tx.send(());
            run_role(other, &working_dir, rx, Duration::from_secs(0)).await.map(|outcome| {
                if let Some(measurement) = outcome.measurement {
                    write_measurement(&working_dir, measurement);
                }
            })
        }
    };

    if let Err(error) = result {
        eprintln!("meshbench-endpoint: {error}");
        std::process::exit(1);
    }
}
