//! Truncated-to-positive normal sampling and unit conversions

use crate::error::{SamplerError, SamplerResult};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Bounded number of rejection attempts before a draw is declared
/// unsatisfiable. Every technology/parameter pair in the mixture has a
/// mean several standard deviations above zero, so in practice this never
/// comes close to firing; it exists to turn a pathological configuration
/// into a reported error instead of an infinite loop.
pub const K_MAX_SAMPLE_ATTEMPTS: u32 = 10_000;

/// Draw from `Normal(mean, stddev)`, rejecting negative samples, until a
/// non-negative value is produced or the attempt budget is exhausted.
pub fn sample_truncated_positive_normal<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    stddev: f64,
) -> SamplerResult<f64> {
    let normal = Normal::new(mean, stddev).map_err(|_| SamplerError::Unsatisfiable {
        attempts: 0,
        mean,
        stddev,
    })?;

    for attempt in 0..K_MAX_SAMPLE_ATTEMPTS {
        let sample = normal.sample(rng);
        if sample >= 0.0 {
            return Ok(sample);
        }
        let _ = attempt;
    }

    Err(SamplerError::Unsatisfiable {
        attempts: K_MAX_SAMPLE_ATTEMPTS,
        mean,
        stddev,
    })
}

/// Convert a Mbit/s value to integer Kbit/s using round-half-away-from-zero.
///
/// The source dataset documents Mbit/s means/stddevs; the data model stores
/// integer Kbit/s, so every upload/download draw passes through here.
pub fn mbit_to_kbit(mbit: f64) -> u32 {
    let kbit = mbit * 1000.0;
    round_half_away_from_zero(kbit) as u32
}

fn round_half_away_from_zero(value: f64) -> i64 {
    if value >= 0.0 {
        (value + 0.5).floor() as i64
    } else {
        (value - 0.5).ceil() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn truncated_normal_never_returns_negative() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let sample = sample_truncated_positive_normal(&mut rng, 0.824, 0.211).unwrap();
            assert!(sample >= 0.0);
        }
    }

    #[test]
    fn mbit_to_kbit_rounds_half_away_from_zero() {
        assert_eq!(mbit_to_kbit(0.8245), 825); // 824.5 -> 825
        assert_eq!(mbit_to_kbit(9.489), 9489);
        assert_eq!(mbit_to_kbit(0.0005), 1); // 0.5 -> 1
        assert_eq!(mbit_to_kbit(0.0), 0);
    }
}
