//! Per-edge measurement (§4.5.1)
//!
//! Probing genuinely happens "inside" a namespace endpoint via exec in a
//! real deployment, which is out of scope for the harness's own process
//! (Design Notes). `EdgeProbe` is the external-collaborator seam;
//! `TcpEdgeProbe` is a reference implementation for single-host runs and
//! tests, talking plain TCP between the two addresses it's given.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Round trips averaged for one latency measurement.
const ECHO_ROUND_TRIPS: usize = 4;
/// Bulk payload size for one throughput measurement.
const THROUGHPUT_PAYLOAD_BYTES: usize = 1_000_000;

/// Result of probing one overlay edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeMeasurement {
    pub measured_latency_ms: f64,
    pub measured_bandwidth_kbps: f64,
}

/// External-collaborator seam for per-edge probing.
#[async_trait]
pub trait EdgeProbe: Send + Sync {
    async fn probe(&self, echo_addr: SocketAddr, throughput_addr: SocketAddr) -> std::io::Result<EdgeMeasurement>;
}

/// Plain-TCP reference prober: an echo-and-measure RTT probe, and a
/// one-shot bulk-send throughput probe, both against servers already
/// running at the given addresses.
pub struct TcpEdgeProbe;

#[async_trait]
impl EdgeProbe for TcpEdgeProbe {
    async fn probe(&self, echo_addr: SocketAddr, throughput_addr: SocketAddr) -> std::io::Result<EdgeMeasurement> {
        let measured_latency_ms = measure_latency(echo_addr).await?;
        let measured_bandwidth_kbps = measure_bandwidth(throughput_addr).await?;
        Ok(EdgeMeasurement { measured_latency_ms, measured_bandwidth_kbps })
    }
}

/// Run `ECHO_ROUND_TRIPS` back-to-back pings against `addr`, returning the
/// arithmetic mean RTT in milliseconds.
async fn measure_latency(addr: SocketAddr) -> std::io::Result<f64> {
    let mut stream = TcpStream::connect(addr).await?;
    let mut total = Duration::ZERO;
    let ping = [0u8; 8];
    let mut pong = [0u8; 8];

    for _ in 0..ECHO_ROUND_TRIPS {
        let start = Instant::now();
        stream.write_all(&ping).await?;
        stream.read_exact(&mut pong).await?;
        total += start.elapsed();
    }

    Ok(total.as_secs_f64() * 1000.0 / ECHO_ROUND_TRIPS as f64)
}

/// Send `THROUGHPUT_PAYLOAD_BYTES` to `addr` and let the server compute
/// the receiver-side bit-rate, reported back over the same connection.
async fn measure_bandwidth(addr: SocketAddr) -> std::io::Result<f64> {
    let mut stream = TcpStream::connect(addr).await?;
    let payload = vec![0u8; THROUGHPUT_PAYLOAD_BYTES];
    stream.write_all(&payload).await?;
    stream.shutdown().await?;

    let mut rate_buf = [0u8; 8];
    stream.read_exact(&mut rate_buf).await?;
    Ok(f64::from_be_bytes(rate_buf))
}

/// Serve one echo connection: read 8 bytes, write them back, repeat until
/// the peer closes. Meant to be spawned once per probed edge.
pub async fn run_echo_server(listener: TcpListener) -> std::io::Result<()> {
    let (mut stream, _) = listener.accept().await?;
    let mut buf = [0u8; 8];
    loop {
        match stream.read_exact(&mut buf).await {
            Ok(_) => stream.write_all(&buf).await?,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

/// Serve one throughput connection: read until EOF, time the transfer,
/// then write back the measured Kbit/s as an 8-byte big-endian f64.
pub async fn run_throughput_server(listener: TcpListener) -> std::io::Result<f64> {
    let (mut stream, _) = listener.accept().await?;
    let start = Instant::now();
    let mut buf = vec![0u8; 64 * 1024];
    let mut total_bytes: u64 = 0;
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total_bytes += n as u64;
    }
    let elapsed = start.elapsed();
    let kbps = if elapsed.as_secs_f64() > 0.0 { (total_bytes as f64 * 8.0 / 1000.0) / elapsed.as_secs_f64() } else { 0.0 };

    stream.write_all(&kbps.to_be_bytes()).await?;
    Ok(kbps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probes_latency_and_bandwidth_against_local_servers() {
        let echo_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let echo_addr = echo_listener.local_addr().unwrap();
        let echo_task = tokio::spawn(run_echo_server(echo_listener));

        let throughput_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let throughput_addr = throughput_listener.local_addr().unwrap();
        let throughput_task = tokio::spawn(run_throughput_server(throughput_listener));

        let probe = TcpEdgeProbe;
        let measurement = probe.probe(echo_addr, throughput_addr).await.unwrap();

        assert!(measurement.measured_latency_ms >= 0.0);
        assert!(measurement.measured_bandwidth_kbps > 0.0);

        echo_task.await.unwrap().unwrap();
        throughput_task.await.unwrap().unwrap();
    }
}
