//! Receiving side of the transfer wire format, with bounded connect retry
//! and per-attempt timing (§4.4.1)

use crate::measurement::ConnectionMeasurement;
use crate::retry::{retry, K_MAX_ATTEMPTS};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// Outcome of a completed receive: the timing measurement plus bytes
/// written to `dest`.
#[derive(Debug, Clone, Copy)]
pub struct ReceiveOutcome {
    pub measurement: ConnectionMeasurement,
    pub bytes_received: u64,
}

/// Error for a single connect-and-receive attempt: either the TCP
/// handshake itself failed, or it completed but no bytes arrived before
/// the peer closed (counted as a failed attempt per §4.4.1).
#[derive(Debug)]
pub enum AttemptError {
    Connect(std::io::Error),
    NoBytesBeforeClose,
    Io(std::io::Error),
}

/// Connect to `addr` with bounded retry, receive the artifact, and stream
/// it to `dest` in strict append order. Returns `ConnectRetry` semantics
/// to the caller via the `RetryExhausted` wrapper when every attempt
/// fails.
pub async fn connect_and_receive(
    addr: SocketAddr,
    dest: &Path,
) -> Result<ReceiveOutcome, crate::retry::RetryExhausted<AttemptError>> {
    retry("connect_and_receive", |attempt_no| {
        let dest = dest.to_path_buf();
        async move {
            debug!(%addr, attempt_no, "attempting connection");
            let attempt_start = Instant::now();
            let mut stream = TcpStream::connect(addr).await.map_err(AttemptError::Connect)?;

            let mut len_buf = [0u8; 8];
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(AttemptError::NoBytesBeforeClose),
                Err(e) => return Err(AttemptError::Io(e)),
            }
            let expected_len = u64::from_be_bytes(len_buf);

            let byte_stream_start = Instant::now();
            let mut file = File::create(&dest).await.map_err(AttemptError::Io)?;
            let bytes_received = tokio::io::copy(&mut (&mut stream).take(expected_len), &mut file)
                .await
                .map_err(AttemptError::Io)?;
            file.flush().await.map_err(AttemptError::Io)?;
            let byte_stream_end = Instant::now();

            if bytes_received == 0 && expected_len > 0 {
                return Err(AttemptError::NoBytesBeforeClose);
            }

            Ok(ReceiveOutcome {
                measurement: ConnectionMeasurement::from_instants(attempt_start, byte_stream_start, byte_stream_end),
                bytes_received,
            })
        }
    })
    .await
    .map_err(|mut exhausted| {
        exhausted.attempts = K_MAX_ATTEMPTS;
        exhausted
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::serve_once;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn receives_the_full_artifact_in_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let artifact = b"the quick brown fox".to_vec();

        let artifact_clone = artifact.clone();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            serve_once(&mut stream, &artifact_clone).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("received.bin");
        let outcome = connect_and_receive(addr, &dest).await.unwrap();

        assert_eq!(outcome.bytes_received, artifact.len() as u64);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), artifact);
    }

    #[tokio::test]
    async fn peer_closing_without_sending_anything_is_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            // First connection: accept then immediately drop (no bytes).
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
            // Second connection: serve properly.
            let (mut stream, _) = listener.accept().await.unwrap();
            serve_once(&mut stream, b"payload").await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("received.bin");
        let outcome = connect_and_receive(addr, &dest).await.unwrap();
        assert_eq!(outcome.bytes_received, 7);
    }
}
