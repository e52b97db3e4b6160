//! Peer profile type

use serde::{Deserialize, Serialize};

/// Reserved name of the peer that holds the original artifact
pub const ORIGIN_NAME: &str = "origin";

/// A single peer's network profile
///
/// Immutable once created: the Sampler is the only component that
/// constructs these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Peer identity. `"origin"` is reserved for the file source.
    pub name: String,
    /// Maximum upload capacity, in Kbit/s. Always > 0 and < `max_download`.
    pub max_upload: u32,
    /// Maximum download capacity, in Kbit/s. Always > 0.
    pub max_download: u32,
    /// One-way latency, in milliseconds. Always >= 0.
    pub latency: f64,
    /// Packet loss fraction, in [0, 1].
    pub loss: f64,
}

impl Peer {
    /// Construct a new peer profile.
    ///
    /// Does not validate `max_upload < max_download`; the Sampler's
    /// distributions are shaped so that invariant holds by construction for
    /// every technology in the mixture, and validating here would just
    /// duplicate that guarantee on every draw.
    pub fn new(name: impl Into<String>, max_upload: u32, max_download: u32, latency: f64, loss: f64) -> Self {
        Self {
            name: name.into(),
            max_upload,
            max_download,
            latency,
            loss,
        }
    }

    /// Whether this peer is the reserved file-source peer.
    pub fn is_origin(&self) -> bool {
        self.name == ORIGIN_NAME
    }
}
