//! Artifact integrity check (§4.5.2): SHA-256 of the origin file compared
//! against each non-origin endpoint's received copy.

use crate::error::{ValidatorError, ValidatorResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// SHA-256 of `path`'s contents, hex-encoded.
pub async fn hash_file(path: &Path) -> std::io::Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Candidate paths a received artifact might live at, rooted at an
/// endpoint's working directory, in the order the original deployment
/// model would search them.
pub fn candidate_paths(working_dir: &Path, source_peer: &str) -> Vec<PathBuf> {
    vec![
        working_dir.join("mydocument.pdf"),
        working_dir.join("receivedFromOrigin.pdf"),
        working_dir.join(format!("receivedFrom-{source_peer}.pdf")),
    ]
}

/// Find the first candidate path that exists under `working_dir` for
/// `endpoint_name`/`source_peer`, hash it, and compare against
/// `origin_hash`.
pub async fn verify_endpoint(
    endpoint_name: &str,
    working_dir: &Path,
    source_peer: &str,
    origin_hash: &str,
) -> ValidatorResult<()> {
    for candidate in candidate_paths(working_dir, source_peer) {
        if tokio::fs::metadata(&candidate).await.is_ok() {
            let hash = hash_file(&candidate).await?;
            return if hash == origin_hash {
                Ok(())
            } else {
                Err(ValidatorError::HashMismatch(endpoint_name.to_string()))
            };
        }
    }
    Err(ValidatorError::MissingArtifact(endpoint_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn matching_hash_passes() {
        let dir = tempfile::tempdir().unwrap();
        let origin_path = dir.path().join("mydocument.pdf");
        tokio::fs::write(&origin_path, b"artifact bytes").await.unwrap();
        let origin_hash = hash_file(&origin_path).await.unwrap();

        let leaf_dir = tempfile::tempdir().unwrap();
        tokio::fs::write(leaf_dir.path().join("receivedFromOrigin.pdf"), b"artifact bytes").await.unwrap();

        verify_endpoint("1", leaf_dir.path(), "origin", &origin_hash).await.unwrap();
    }

    #[tokio::test]
    async fn mismatched_hash_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("receivedFromOrigin.pdf"), b"corrupted").await.unwrap();

        let result = verify_endpoint("1", dir.path(), "origin", "deadbeef").await;
        assert!(matches!(result, Err(ValidatorError::HashMismatch(_))));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = verify_endpoint("1", dir.path(), "origin", "deadbeef").await;
        assert!(matches!(result, Err(ValidatorError::MissingArtifact(_))));
    }

    #[tokio::test]
    async fn scenario_s6_one_corrupted_leaf_fails_the_rest_pass() {
        let origin_dir = tempfile::tempdir().unwrap();
        let origin_path = origin_dir.path().join("mydocument.pdf");
        let artifact = b"the quick brown fox jumps over the lazy dog";
        tokio::fs::write(&origin_path, artifact).await.unwrap();
        let origin_hash = hash_file(&origin_path).await.unwrap();

        let leaves = ["1", "2", "3"];
        let mut leaf_dirs = Vec::new();
        for (i, leaf) in leaves.iter().enumerate() {
            let dir = tempfile::tempdir().unwrap();
            let mut bytes = artifact.to_vec();
            if *leaf == "2" {
                bytes[0] ^= 0xFF; // corrupt one byte in this leaf only
            }
            tokio::fs::write(dir.path().join("receivedFromOrigin.pdf"), &bytes).await.unwrap();
            leaf_dirs.push((leaf.to_string(), dir, i));
        }

        for (leaf, dir, _) in &leaf_dirs {
            let result = verify_endpoint(leaf, dir.path(), "origin", &origin_hash).await;
            if leaf == "2" {
                assert!(matches!(result, Err(ValidatorError::HashMismatch(ref endpoint)) if endpoint == "2"));
            } else {
                assert!(result.is_ok(), "endpoint {leaf} should pass integrity check");
            }
        }
    }
}
