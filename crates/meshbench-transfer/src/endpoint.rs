//! Per-endpoint role orchestration: wires the sender/receiver/tracker
//! primitives together for each of origin/super-peer/leaf (§4.4).

use crate::error::{TransferError, TransferResult};
use crate::measurement::ConnectionMeasurement;
use crate::receiver::connect_and_receive;
use crate::role::{LeafConfig, OriginConfig, Role, SuperPeerConfig, FILE_TRANSFER_PORT, TRACKER_PORT};
use crate::sender::serve_clients;
use crate::tracker::send_confirmation;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

/// Candidate received-artifact paths searched by the Validator (§4.5.2),
/// rooted at an endpoint's working directory.
pub fn received_artifact_path(working_dir: &Path, source_peer: &str) -> PathBuf {
    if source_peer == "origin" {
        working_dir.join("receivedFromOrigin.pdf")
    } else {
        working_dir.join(format!("receivedFrom-{source_peer}.pdf"))
    }
}

/// Origin's own copy of the artifact, served to its overlay successors.
pub fn origin_artifact_path(working_dir: &Path) -> PathBuf {
    working_dir.join("mydocument.pdf")
}

/// Outcome an endpoint reports after running its role to completion.
#[derive(Debug, Clone)]
pub struct EndpointOutcome {
    pub measurement: Option<ConnectionMeasurement>,
}

/// Wait until a short TCP connect against `addr` succeeds, with the same
/// bounded retry/backoff as every other connector (§4.4.3's liveness
/// check).
async fn wait_until_reachable(addr: SocketAddr) {
    loop {
        if TcpStream::connect(addr).await.is_ok() {
            return;
        }
        tokio::time::sleep(crate::retry::K_RETRY_INTERVAL).await;
    }
}

/// Run `role` to completion, reading/writing artifact files under
/// `working_dir`. `shaping_ready` resolves once the Fabric Builder
/// confirms this endpoint's shaping rules are applied (ignored for
/// roles other than origin); `fallback_deadline` bounds how long origin
/// waits on it before binding anyway.
pub async fn run_role(
    role: Role,
    working_dir: &Path,
    shaping_ready: tokio::sync::oneshot::Receiver<()>,
    fallback_deadline: Duration,
) -> TransferResult<EndpointOutcome> {
    match role {
        Role::Origin(cfg) => run_origin(cfg, working_dir, shaping_ready, fallback_deadline).await,
        Role::SuperPeer(cfg) => run_superpeer(cfg, working_dir).await,
        Role::Leaf(cfg) => run_leaf(cfg, working_dir).await,
        Role::Tracker(_) => Err(TransferError::InvalidEnvironment(
            "run_role does not drive the tracker role; use tracker::run_tracker".to_string(),
        )),
    }
}

async fn run_origin(
    cfg: OriginConfig,
    working_dir: &Path,
    shaping_ready: tokio::sync::oneshot::Receiver<()>,
    fallback_deadline: Duration,
) -> TransferResult<EndpointOutcome> {
    let _ = tokio::time::timeout(fallback_deadline, shaping_ready).await;

    let tracker_addr = tracker_socket_addr(cfg.tracker_ip);
    let bind_addr = SocketAddr::new(cfg.ip_address.into(), FILE_TRANSFER_PORT);
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|source| TransferError::BindRetry { addr: bind_addr.to_string(), source })?;
    info!(%bind_addr, "origin listener bound, starting dissemination clock");

    send_confirmation(tracker_addr).await?;

    let artifact = tokio::fs::read(origin_artifact_path(working_dir)).await?;
    serve_clients(listener, Arc::new(artifact), cfg.targets.len()).await?;

    Ok(EndpointOutcome { measurement: None })
}

async fn run_superpeer(cfg: SuperPeerConfig, working_dir: &Path) -> TransferResult<EndpointOutcome> {
    let tracker_addr = tracker_socket_addr(cfg.tracker_ip);
    let source_addr = SocketAddr::new(Ipv4Addr::from(cfg.source_ip).into(), FILE_TRANSFER_PORT);
    wait_until_reachable(liveness_addr(cfg.source_ip)).await;

    let dest = received_artifact_path(working_dir, &cfg.source_peer);
    let outcome = connect_and_receive(source_addr, &dest)
        .await
        .map_err(|e| TransferError::ConnectRetry { addr: source_addr.to_string(), attempts: e.attempts })?;

    send_confirmation(tracker_addr).await?;
    info!(measurement = ?outcome.measurement, "super-peer received artifact from origin");

    let bind_addr = SocketAddr::new(cfg.ip_address.into(), FILE_TRANSFER_PORT);
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|source| TransferError::BindRetry { addr: bind_addr.to_string(), source })?;

    let artifact = tokio::fs::read(&dest).await?;
    serve_clients(listener, Arc::new(artifact), cfg.targets.len()).await?;

    Ok(EndpointOutcome { measurement: Some(outcome.measurement) })
}

async fn run_leaf(cfg: LeafConfig, working_dir: &Path) -> TransferResult<EndpointOutcome> {
    let tracker_addr = tracker_socket_addr(cfg.tracker_ip);
    let source_addr = SocketAddr::new(Ipv4Addr::from(cfg.source_ip).into(), FILE_TRANSFER_PORT);
    wait_until_reachable(liveness_addr(cfg.source_ip)).await;

    let dest = received_artifact_path(working_dir, &cfg.source_peer);
    let outcome = connect_and_receive(source_addr, &dest)
        .await
        .map_err(|e| TransferError::ConnectRetry { addr: source_addr.to_string(), attempts: e.attempts })?;

    send_confirmation(tracker_addr).await?;
    info!(measurement = ?outcome.measurement, "leaf received artifact");

    Ok(EndpointOutcome { measurement: Some(outcome.measurement) })
}

fn liveness_addr(source_ip: Ipv4Addr) -> SocketAddr {
    SocketAddr::new(source_ip.into(), FILE_TRANSFER_PORT)
}

/// Tracker socket address, built from the tracker endpoint's management IP.
pub fn tracker_socket_addr(tracker_ip: Ipv4Addr) -> SocketAddr {
    SocketAddr::new(tracker_ip.into(), TRACKER_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_paths_match_role_naming() {
        let dir = Path::new("/app");
        assert_eq!(received_artifact_path(dir, "origin"), PathBuf::from("/app/receivedFromOrigin.pdf"));
        assert_eq!(received_artifact_path(dir, "2"), PathBuf::from("/app/receivedFrom-2.pdf"));
        assert_eq!(origin_artifact_path(dir), PathBuf::from("/app/mydocument.pdf"));
    }

    #[tokio::test]
    async fn end_to_end_origin_to_leaf_transfer_matches_hash() {
        use sha2::{Digest, Sha256};

        let dir = tempfile::tempdir().unwrap();
        let origin_dir = dir.path().join("origin");
        let leaf_dir = dir.path().join("leaf");
        tokio::fs::create_dir_all(&origin_dir).await.unwrap();
        tokio::fs::create_dir_all(&leaf_dir).await.unwrap();

        let artifact = b"integrity check payload".to_vec();
        tokio::fs::write(origin_artifact_path(&origin_dir), &artifact).await.unwrap();

        let origin_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let origin_addr = origin_listener.local_addr().unwrap();

        let artifact_clone = artifact.clone();
        let serve = tokio::spawn(async move {
            let data = tokio::fs::read(origin_artifact_path(&origin_dir)).await.unwrap();
            assert_eq!(data, artifact_clone);
            crate::sender::serve_clients(origin_listener, Arc::new(data), 1).await.unwrap();
        });

        let dest = received_artifact_path(&leaf_dir, "origin");
        let outcome = connect_and_receive(origin_addr, &dest).await.unwrap();
        serve.await.unwrap();

        let received = tokio::fs::read(&dest).await.unwrap();
        assert_eq!(outcome.bytes_received, artifact.len() as u64);

        let expected_hash = Sha256::digest(&artifact);
        let actual_hash = Sha256::digest(&received);
        assert_eq!(expected_hash, actual_hash);
    }
}
