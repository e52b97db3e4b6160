//! Drives per-edge validation with retries (§4.5.1) and folds the results
//! into the run-wide aggregate (§4.5.3).

use crate::aggregate::EdgeValidation;
use crate::error::ValidatorError;
use crate::probe::EdgeProbe;
use crate::tolerance::{percent_error, within_tolerance};
use meshbench_topology::AllocatedEdge;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Total attempts budget per edge before reporting `ShapingDrift`.
pub const MAX_ATTEMPTS: u32 = 3;

/// Validate one overlay edge against its allocated bandwidth/latency,
/// retrying up to [`MAX_ATTEMPTS`] times.
pub async fn validate_edge(
    probe: &dyn EdgeProbe,
    edge: &AllocatedEdge,
    echo_addr: SocketAddr,
    throughput_addr: SocketAddr,
) -> Result<EdgeValidation, ValidatorError> {
    let mut last_errors = None;

    for attempt in 1..=MAX_ATTEMPTS {
        match probe.probe(echo_addr, throughput_addr).await {
            Ok(measurement) => {
                let bw_error_pct = percent_error(measurement.measured_bandwidth_kbps, edge.allocated_bandwidth as f64);
                let lat_error_pct = percent_error(measurement.measured_latency_ms, edge.latency);

                if within_tolerance(bw_error_pct, lat_error_pct, measurement.measured_bandwidth_kbps) {
                    debug!(source = %edge.source, target = %edge.target, attempt, bw_error_pct, lat_error_pct, "edge within tolerance");
                    return Ok(EdgeValidation {
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        bw_error_pct,
                        lat_error_pct,
                        attempts: attempt,
                    });
                }
                warn!(source = %edge.source, target = %edge.target, attempt, bw_error_pct, lat_error_pct, "edge outside tolerance, retrying");
                last_errors = Some((bw_error_pct, lat_error_pct));
            }
            Err(error) => {
                warn!(source = %edge.source, target = %edge.target, attempt, %error, "probe failed, retrying");
            }
        }
    }

    let (bw_error_pct, lat_error_pct) = last_errors.unwrap_or((f64::NAN, f64::NAN));
    Err(ValidatorError::ShapingDrift { source: edge.source.clone(), target: edge.target.clone(), bw_error: bw_error_pct, lat_error: lat_error_pct })
}

/// Validate every edge, collecting passes and failures independently (one
/// edge's drift does not block another edge's validation).
pub async fn validate_all(
    probe: &dyn EdgeProbe,
    edges: &[AllocatedEdge],
    resolve: impl Fn(&AllocatedEdge) -> (SocketAddr, SocketAddr),
) -> (Vec<EdgeValidation>, Vec<ValidatorError>) {
    let mut passed = Vec::new();
    let mut failed = Vec::new();

    for edge in edges {
        let (echo_addr, throughput_addr) = resolve(edge);
        match validate_edge(probe, edge, echo_addr, throughput_addr).await {
            Ok(validation) => passed.push(validation),
            Err(error) => failed.push(error),
        }
    }

    (passed, failed)
}
