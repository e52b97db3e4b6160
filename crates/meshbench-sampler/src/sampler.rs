//! Peer-population sampler

use crate::distribution::{mbit_to_kbit, sample_truncated_positive_normal};
use crate::error::{SamplerError, SamplerResult};
use crate::peer::{Peer, ORIGIN_NAME};
use crate::technology::select_technology;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Origin upload range, Kbit/s, inclusive lower, exclusive upper
const ORIGIN_UPLOAD_RANGE: std::ops::Range<u32> = 25_000..30_000;
/// Origin download range, Kbit/s, inclusive lower, exclusive upper
const ORIGIN_DOWNLOAD_RANGE: std::ops::Range<u32> = 78_000..80_000;
const ORIGIN_LATENCY_MS: f64 = 40.20;
const ORIGIN_LOSS: f64 = 0.0024;

/// Draws peer network profiles from the technology mixture model.
///
/// The Sampler is the only intentionally non-deterministic component in the
/// harness; it is always explicitly seeded so a run can be replayed from
/// its `testId`/seed pair.
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    /// Create a sampler seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        debug!(seed, "seeding peer sampler");
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Draw `count` non-origin peer profiles, named `"1"..="count"`.
    pub fn sample_peers(&mut self, count: usize) -> SamplerResult<Vec<Peer>> {
        if count == 0 {
            return Err(SamplerError::InvalidPeerCount(count));
        }
        (1..=count)
            .map(|i| self.sample_one(i.to_string()))
            .collect()
    }

    /// Draw the single `origin` profile from its own uniform ranges.
    pub fn sample_origin(&mut self) -> Peer {
        let upload = self.rng.gen_range(ORIGIN_UPLOAD_RANGE);
        let download = self.rng.gen_range(ORIGIN_DOWNLOAD_RANGE);
        Peer::new(ORIGIN_NAME, upload, download, ORIGIN_LATENCY_MS, ORIGIN_LOSS)
    }

    fn sample_one(&mut self, name: String) -> SamplerResult<Peer> {
        let draw = self.rng.gen_range(0.0..100.0);
        let technology = select_technology(draw);
        let params = technology.params();

        let latency = sample_truncated_positive_normal(&mut self.rng, params.latency_mean, params.latency_stddev)?;
        let loss = sample_truncated_positive_normal(&mut self.rng, params.loss_mean, params.loss_stddev)?;

        // Upload/download are each truncated-positive normals, but the data
        // model additionally requires upload < download (every technology's
        // means are far enough apart that this almost never triggers a
        // redraw). Redraw the pair rather than clamp, so the reported
        // values stay on-distribution.
        let (max_upload, max_download) = self.sample_upload_below_download(&params)?;

        Ok(Peer::new(name, max_upload, max_download, latency, loss))
    }

    fn sample_upload_below_download(
        &mut self,
        params: &crate::technology::TechnologyParams,
    ) -> SamplerResult<(u32, u32)> {
        use crate::distribution::K_MAX_SAMPLE_ATTEMPTS;

        for _ in 0..K_MAX_SAMPLE_ATTEMPTS {
            let up_mbit = sample_truncated_positive_normal(&mut self.rng, params.up_mean, params.up_stddev)?;
            let down_mbit = sample_truncated_positive_normal(&mut self.rng, params.down_mean, params.down_stddev)?;
            let max_upload = mbit_to_kbit(up_mbit).max(1);
            let max_download = mbit_to_kbit(down_mbit);
            if max_upload < max_download {
                return Ok((max_upload, max_download));
            }
        }

        Err(SamplerError::Unsatisfiable {
            attempts: K_MAX_SAMPLE_ATTEMPTS,
            mean: params.up_mean,
            stddev: params.up_stddev,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampled_population_has_requested_size() {
        let mut sampler = Sampler::new(42);
        let peers = sampler.sample_peers(25).unwrap();
        assert_eq!(peers.len(), 25);
        assert_eq!(peers[0].name, "1");
        assert_eq!(peers[24].name, "25");
    }

    #[test]
    fn every_peer_respects_upload_below_download() {
        let mut sampler = Sampler::new(123);
        for peer in sampler.sample_peers(200).unwrap() {
            assert!(peer.max_upload > 0);
            assert!(peer.max_upload < peer.max_download);
            assert!(peer.latency >= 0.0);
            assert!(peer.loss >= 0.0);
        }
    }

    #[test]
    fn origin_profile_is_within_its_uniform_ranges() {
        let mut sampler = Sampler::new(1);
        for _ in 0..100 {
            let origin = sampler.sample_origin();
            assert_eq!(origin.name, ORIGIN_NAME);
            assert!(ORIGIN_UPLOAD_RANGE.contains(&origin.max_upload));
            assert!(ORIGIN_DOWNLOAD_RANGE.contains(&origin.max_download));
            assert_eq!(origin.latency, ORIGIN_LATENCY_MS);
            assert_eq!(origin.loss, ORIGIN_LOSS);
        }
    }

    #[test]
    fn same_seed_reproduces_identical_population() {
        let mut a = Sampler::new(99);
        let mut b = Sampler::new(99);
        assert_eq!(a.sample_peers(10).unwrap(), b.sample_peers(10).unwrap());
    }
}
