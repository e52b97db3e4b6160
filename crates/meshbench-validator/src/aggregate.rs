//! Aggregation across a run's per-edge validations (§4.5.3)

/// One overlay edge's validation outcome.
#[derive(Debug, Clone)]
pub struct EdgeValidation {
    pub source: String,
    pub target: String,
    pub bw_error_pct: f64,
    pub lat_error_pct: f64,
    pub attempts: u32,
}

/// min/mean/max over a series of per-edge error percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

impl ErrorStats {
    fn from_values(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Self { min, mean, max }
    }
}

/// Aggregate bandwidth-error and latency-error statistics across every
/// validated edge. Returns `None` if `results` is empty.
pub fn aggregate(results: &[EdgeValidation]) -> Option<(ErrorStats, ErrorStats)> {
    if results.is_empty() {
        return None;
    }
    let bw_errors: Vec<f64> = results.iter().map(|r| r.bw_error_pct).collect();
    let lat_errors: Vec<f64> = results.iter().map(|r| r.lat_error_pct).collect();
    Some((ErrorStats::from_values(&bw_errors), ErrorStats::from_values(&lat_errors)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_min_mean_max_across_edges() {
        let results = vec![
            EdgeValidation { source: "origin".into(), target: "1".into(), bw_error_pct: 1.0, lat_error_pct: 5.0, attempts: 1 },
            EdgeValidation { source: "origin".into(), target: "2".into(), bw_error_pct: 3.0, lat_error_pct: 15.0, attempts: 2 },
            EdgeValidation { source: "origin".into(), target: "3".into(), bw_error_pct: 2.0, lat_error_pct: 10.0, attempts: 1 },
        ];

        let (bw, lat) = aggregate(&results).unwrap();
        assert_eq!(bw, ErrorStats { min: 1.0, mean: 2.0, max: 3.0 });
        assert_eq!(lat, ErrorStats { min: 5.0, mean: 10.0, max: 15.0 });
    }

    #[test]
    fn empty_results_aggregate_to_none() {
        assert!(aggregate(&[]).is_none());
    }
}
