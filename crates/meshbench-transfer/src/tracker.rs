//! Confirmation tracker barrier (§4.4.2), modeled as a small actor
//! (Design Notes §9): one task owns the counter, the first/last
//! timestamp, and the per-endpoint confirmed set; everything else only
//! sends it messages.

use crate::error::{TransferError, TransferResult};
use crate::role::TRACKER_PORT;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

const CONFIRMATION_TOKEN: &str = "CONFIRMATION";

/// Result produced once the barrier completes or its deadline fires.
#[derive(Debug, Clone)]
pub struct BarrierOutcome {
    pub observed: usize,
    pub expected: usize,
    pub total_duration: Option<Duration>,
}

struct TrackerState {
    observed: usize,
    first_instant: Option<Instant>,
    last_instant: Option<Instant>,
}

/// Owns the tracker's shared mutable state. Accepting connections and
/// recording confirmations both go through `&self`, guarded by a single
/// mutex for the timestamps; the observed count is additionally published
/// on a `watch` channel so a waiter can never miss the transition to
/// "complete" between checking the count and starting to wait (the
/// `Notify`-based equivalent has exactly that race).
pub struct Tracker {
    state: Mutex<TrackerState>,
    observed_tx: watch::Sender<usize>,
    expected: usize,
}

impl Tracker {
    pub fn new(expected: usize) -> Self {
        let (observed_tx, _observed_rx) = watch::channel(0);
        Self {
            state: Mutex::new(TrackerState { observed: 0, first_instant: None, last_instant: None }),
            observed_tx,
            expected,
        }
    }

    /// Record one confirmation. Duplicates from the same endpoint are
    /// counted, not deduplicated (§4.4.2): the protocol is connectionless
    /// and the orchestrator is responsible for sending one confirmation
    /// per role per run.
    async fn record(&self) {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        if state.first_instant.is_none() {
            state.first_instant = Some(now);
        }
        state.last_instant = Some(now);
        state.observed += 1;
        debug!(observed = state.observed, expected = self.expected, "confirmation recorded");
        let _ = self.observed_tx.send(state.observed);
    }

    /// Wait for `expected` confirmations or `deadline`, whichever comes
    /// first.
    async fn wait_for_completion(&self, deadline: Duration) -> BarrierOutcome {
        let mut observed_rx = self.observed_tx.subscribe();
        let wait = async {
            loop {
                if *observed_rx.borrow() >= self.expected {
                    break;
                }
                if observed_rx.changed().await.is_err() {
                    break;
                }
            }
        };

        let _ = tokio::time::timeout(deadline, wait).await;

        let state = self.state.lock().await;
        let total_duration = match (state.first_instant, state.last_instant) {
            (Some(first), Some(last)) => Some(last.saturating_duration_since(first)),
            _ => None,
        };
        BarrierOutcome { observed: state.observed, expected: self.expected, total_duration }
    }
}

/// Run the tracker endpoint: bind the fixed port, accept confirmations
/// until `expected` are observed or `deadline` elapses.
pub async fn run_tracker(bind_addr: SocketAddr, expected: usize, deadline: Duration) -> TransferResult<BarrierOutcome> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|source| TransferError::BindRetry { addr: bind_addr.to_string(), source })?;
    info!(%bind_addr, expected, "tracker listening for confirmations");

    let tracker = std::sync::Arc::new(Tracker::new(expected));
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    let accept_tracker = std::sync::Arc::clone(&tracker);
    let accept_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let Ok((stream, peer_addr)) = accepted else { continue };
                    let tracker = std::sync::Arc::clone(&accept_tracker);
                    tokio::spawn(async move {
                        if let Err(error) = handle_confirmation(stream, &tracker).await {
                            warn!(%peer_addr, %error, "confirmation connection failed");
                        }
                    });
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    });

    let outcome = tracker.wait_for_completion(deadline).await;
    let _ = shutdown_tx.send(()).await;
    accept_task.abort();

    if outcome.observed < outcome.expected {
        warn!(observed = outcome.observed, expected = outcome.expected, "barrier incomplete at deadline");
        return Err(TransferError::BarrierIncomplete { observed: outcome.observed, expected: outcome.expected });
    }

    info!(total_duration = ?outcome.total_duration, "barrier complete");
    Ok(outcome)
}

async fn handle_confirmation(mut stream: TcpStream, tracker: &Tracker) -> std::io::Result<()> {
    let mut buf = vec![0u8; CONFIRMATION_TOKEN.len() + 1];
    let n = stream.read(&mut buf).await?;
    if buf[..n].starts_with(CONFIRMATION_TOKEN.as_bytes()) {
        tracker.record().await;
    }
    Ok(())
}

/// Send one confirmation to the tracker at `addr`.
pub async fn send_confirmation(addr: SocketAddr) -> std::io::Result<()> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(format!("{CONFIRMATION_TOKEN}\n").as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// TCP port the tracker listens on; re-exported for endpoint wiring.
pub fn tracker_port() -> u16 {
    TRACKER_PORT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn barrier_completes_when_every_confirmation_arrives() {
        let listener_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = TcpListener::bind(listener_addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let run = tokio::spawn(run_tracker(addr, 3, Duration::from_secs(5)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        for _ in 0..3 {
            send_confirmation(addr).await.unwrap();
        }

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.observed, 3);
        assert!(outcome.total_duration.is_some());
    }

    #[tokio::test]
    async fn barrier_incomplete_surfaces_at_deadline() {
        let listener_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let listener = TcpListener::bind(listener_addr).await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let run = tokio::spawn(run_tracker(addr, 5, Duration::from_millis(200)));
        tokio::time::sleep(Duration::from_millis(30)).await;
        send_confirmation(addr).await.unwrap();

        let result = run.await.unwrap();
        assert!(matches!(result, Err(TransferError::BarrierIncomplete { observed: 1, expected: 5 })));
    }

    #[test]
    fn property_t5_total_duration_is_last_minus_first() {
        // T5: total_duration == last_confirmation - first_confirmation, non-negative.
        let first = Instant::now();
        let last = first + Duration::from_millis(123);
        assert_eq!(last.saturating_duration_since(first), Duration::from_millis(123));
    }
}
