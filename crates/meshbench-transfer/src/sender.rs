//! File-serving side of the transfer wire format
//!
//! Out of scope per §1 ("any sensible streaming transfer suffices"): this
//! is a deliberately simple length-prefixed stream, not a protocol
//! contract the Validator or a real deployment needs to match.

use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Serve `artifact` once over `stream`: an 8-byte big-endian length prefix
/// followed by the raw bytes.
pub async fn serve_once(stream: &mut TcpStream, artifact: &[u8]) -> std::io::Result<()> {
    stream.write_all(&(artifact.len() as u64).to_be_bytes()).await?;
    stream.write_all(artifact).await?;
    stream.flush().await
}

/// Bind `addr` and serve `artifact` to exactly `expected_clients`
/// connections, one task per connection. Returns once every expected
/// client has been served (or the listener errors).
pub async fn serve_clients(
    listener: TcpListener,
    artifact: Arc<Vec<u8>>,
    expected_clients: usize,
) -> std::io::Result<()> {
    let mut served = 0usize;
    let mut tasks = Vec::with_capacity(expected_clients);

    while served < expected_clients {
        let (mut stream, peer_addr) = listener.accept().await?;
        served += 1;
        debug!(%peer_addr, served, expected_clients, "accepted downstream connection");
        let artifact = Arc::clone(&artifact);
        tasks.push(tokio::spawn(async move {
            if let Err(error) = serve_once(&mut stream, &artifact).await {
                warn!(%peer_addr, %error, "failed to serve artifact to downstream peer");
            }
        }));
    }

    for task in tasks {
        let _ = task.await;
    }
    info!(served, "finished serving all downstream connections");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn serves_the_artifact_to_every_expected_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let artifact = Arc::new(b"hello mesh".to_vec());

        let serve = tokio::spawn(serve_clients(listener, Arc::clone(&artifact), 2));

        for _ in 0..2 {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            let mut len_buf = [0u8; 8];
            stream.read_exact(&mut len_buf).await.unwrap();
            let len = u64::from_be_bytes(len_buf) as usize;
            let mut buf = vec![0u8; len];
            stream.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, *artifact);
        }

        serve.await.unwrap().unwrap();
    }
}
