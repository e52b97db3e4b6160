//! Result Record persistence (§3, §6): one append-only CSV row per
//! completed run, keyed by a monotonic `test_id`.

use crate::config::{results_file, test_id_file};
use anyhow::{Context, Result};
use meshbench_topology::OverlayVariant;
use meshbench_validator::ErrorStats;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{Read, Write};

/// One row of the results log: peer count, overlay variant, artifact
/// size, bandwidth/error/timing aggregates, and the integrity flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    pub test_id: u64,
    pub recorded_at: String,
    pub peer_count: usize,
    pub overlay_variant: String,
    pub artifact_size_bytes: u64,

    pub bandwidth_min_kbps: f64,
    pub bandwidth_avg_kbps: f64,
    pub bandwidth_max_kbps: f64,

    pub latency_error_min_pct: f64,
    pub latency_error_avg_pct: f64,
    pub latency_error_max_pct: f64,

    pub bandwidth_error_min_pct: f64,
    pub bandwidth_error_avg_pct: f64,
    pub bandwidth_error_max_pct: f64,

    pub connection_time_min_ms: f64,
    pub connection_time_avg_ms: f64,
    pub connection_time_max_ms: f64,

    pub transfer_time_min_ms: f64,
    pub transfer_time_avg_ms: f64,
    pub transfer_time_max_ms: f64,

    pub total_time_min_ms: f64,
    pub total_time_avg_ms: f64,
    pub total_time_max_ms: f64,

    pub hash_match: bool,
}

/// min/avg/max over a series of values. Unit-agnostic: used for both
/// bandwidth (Kbit/s) and timing (milliseconds) columns.
#[derive(Debug, Clone, Copy)]
pub struct TimingStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl TimingStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self { min: 0.0, avg: 0.0, max: 0.0 };
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Self { min, avg, max }
    }
}

#[allow(clippy::too_many_arguments)]
impl ResultRecord {
    pub fn new(
        test_id: u64,
        peer_count: usize,
        overlay_variant: OverlayVariant,
        artifact_size_bytes: u64,
        bandwidth: TimingStats,
        latency_error: Option<ErrorStats>,
        bandwidth_error: Option<ErrorStats>,
        connection_time: TimingStats,
        transfer_time: TimingStats,
        total_time: TimingStats,
        hash_match: bool,
    ) -> Self {
        let (lat_min, lat_avg, lat_max) =
            latency_error.map(|s| (s.min, s.mean, s.max)).unwrap_or((0.0, 0.0, 0.0));
        let (bw_err_min, bw_err_avg, bw_err_max) =
            bandwidth_error.map(|s| (s.min, s.mean, s.max)).unwrap_or((0.0, 0.0, 0.0));

        Self {
            test_id,
            recorded_at: chrono::Utc::now().to_rfc3339(),
            peer_count,
            overlay_variant: match overlay_variant {
                OverlayVariant::Star => "star".to_string(),
                OverlayVariant::TwoTier => "two_tier".to_string(),
            },
            artifact_size_bytes,
            bandwidth_min_kbps: bandwidth.min,
            bandwidth_avg_kbps: bandwidth.avg,
            bandwidth_max_kbps: bandwidth.max,
            latency_error_min_pct: lat_min,
            latency_error_avg_pct: lat_avg,
            latency_error_max_pct: lat_max,
            bandwidth_error_min_pct: bw_err_min,
            bandwidth_error_avg_pct: bw_err_avg,
            bandwidth_error_max_pct: bw_err_max,
            connection_time_min_ms: connection_time.min,
            connection_time_avg_ms: connection_time.avg,
            connection_time_max_ms: connection_time.max,
            transfer_time_min_ms: transfer_time.min,
            transfer_time_avg_ms: transfer_time.avg,
            transfer_time_max_ms: transfer_time.max,
            total_time_min_ms: total_time.min,
            total_time_avg_ms: total_time.avg,
            total_time_max_ms: total_time.max,
            hash_match,
        }
    }
}

/// Allocate the next monotonic `test_id`, persisting the counter so it
/// survives across invocations.
pub fn next_test_id() -> Result<u64> {
    let path = test_id_file();
    std::fs::create_dir_all(path.parent().unwrap())?;

    let mut file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let current: u64 = contents.trim().parse().unwrap_or(0);
    let next = current + 1;

    file.set_len(0)?;
    use std::io::Seek;
    file.seek(std::io::SeekFrom::Start(0))?;
    write!(file, "{next}")?;
    Ok(next)
}

/// Append one [`ResultRecord`] to the results CSV, writing the header row
/// first if the file does not yet exist.
pub fn append_record(record: &ResultRecord) -> Result<()> {
    let path = results_file();
    std::fs::create_dir_all(path.parent().unwrap())?;
    let needs_header = !path.exists();

    let file = OpenOptions::new().append(true).create(true).open(&path).with_context(|| format!("opening {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
    writer.serialize(record).context("serializing result record")?;
    writer.flush()?;
    Ok(())
}

/// Read every record currently in the results log, in file order.
pub fn read_all() -> Result<Vec<ResultRecord>> {
    let path = results_file();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&path)?;
    let mut records = Vec::new();
    for result in reader.deserialize() {
        records.push(result?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_stats_from_empty_is_zeroed() {
        let stats = TimingStats::from_values(&[]);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 0.0);
    }

    #[test]
    fn timing_stats_computes_min_avg_max() {
        let stats = TimingStats::from_values(&[10.0, 20.0, 30.0]);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.avg, 20.0);
        assert_eq!(stats.max, 30.0);
    }
}
