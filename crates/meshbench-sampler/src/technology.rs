//! Access-technology mixture model
//!
//! Peer profiles are drawn from a categorical mixture of three consumer
//! access technologies, each parameterizing four independent normal
//! distributions (upload, download, latency, loss).

use serde::{Deserialize, Serialize};

/// One of the access technologies in the mixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Technology {
    Adsl,
    Cable,
    Fttc,
}

impl Technology {
    /// Parameters for this technology's four distributions.
    pub fn params(self) -> TechnologyParams {
        match self {
            Technology::Adsl => TechnologyParams {
                up_mean: 0.824,
                up_stddev: 0.211,
                down_mean: 9.489,
                down_stddev: 5.812,
                latency_mean: 25.50,
                latency_stddev: 9.71,
                loss_mean: 0.00197,
                loss_stddev: 0.00475,
            },
            Technology::Cable => TechnologyParams {
                up_mean: 18.612,
                up_stddev: 11.386,
                down_mean: 211.76,
                down_stddev: 106.12,
                latency_mean: 17.64,
                latency_stddev: 2.34,
                loss_mean: 0.00264,
                loss_stddev: 0.01051,
            },
            Technology::Fttc => TechnologyParams {
                up_mean: 13.753,
                up_stddev: 5.233,
                down_mean: 52.61,
                down_stddev: 17.77,
                latency_mean: 12.96,
                latency_stddev: 5.47,
                loss_mean: 0.00050,
                loss_stddev: 0.00074,
            },
        }
    }
}

/// Means and standard deviations for one technology's four distributions.
///
/// Upload/download are in Mbit/s, latency in ms, loss as a fraction.
#[derive(Debug, Clone, Copy)]
pub struct TechnologyParams {
    pub up_mean: f64,
    pub up_stddev: f64,
    pub down_mean: f64,
    pub down_stddev: f64,
    pub latency_mean: f64,
    pub latency_stddev: f64,
    pub loss_mean: f64,
    pub loss_stddev: f64,
}

/// One entry of the technology mixture: a share of the population, in
/// percent, cumulative shares sum to 100.0.
struct MixtureEntry {
    technology: Technology,
    share_percent: f64,
}

/// Fixed mixture weights: ADSL 77.30%, Cable 19.70%, FTTC 3.00%.
const MIXTURE: [MixtureEntry; 3] = [
    MixtureEntry { technology: Technology::Adsl, share_percent: 77.30 },
    MixtureEntry { technology: Technology::Cable, share_percent: 19.70 },
    MixtureEntry { technology: Technology::Fttc, share_percent: 3.00 },
];

/// Select a technology given a single uniform draw in `[0, 100)`.
///
/// Mixture entries are consumed in declaration order; the last entry
/// absorbs any residual from floating-point accumulation so the draw is
/// always covered.
pub fn select_technology(draw_0_to_100: f64) -> Technology {
    let mut cumulative = 0.0;
    for (i, entry) in MIXTURE.iter().enumerate() {
        cumulative += entry.share_percent;
        if draw_0_to_100 < cumulative || i == MIXTURE.len() - 1 {
            return entry.technology;
        }
    }
    unreachable!("mixture is non-empty")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixture_shares_sum_to_100() {
        let total: f64 = MIXTURE.iter().map(|e| e.share_percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn select_technology_covers_full_range() {
        assert_eq!(select_technology(0.0), Technology::Adsl);
        assert_eq!(select_technology(77.0), Technology::Adsl);
        assert_eq!(select_technology(77.30), Technology::Cable);
        assert_eq!(select_technology(90.0), Technology::Cable);
        assert_eq!(select_technology(97.0), Technology::Fttc);
        assert_eq!(select_technology(99.99), Technology::Fttc);
    }
}
