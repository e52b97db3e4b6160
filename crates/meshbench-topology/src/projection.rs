//! Transfer-time projection

use crate::allocation::AllocatedEdge;

/// Project the transfer time, in milliseconds, for `file_bytes` across an
/// edge allocated `allocated_kbit_per_sec` Kbit/s.
///
/// `(file_bytes / 1000) / (alloc / 8) * 1000`, using integer bytes for file
/// size and the allocated Kbit/s for capacity. Seeds the Validator's
/// expected times and the Result Record.
pub fn projected_transfer_ms(file_bytes: u64, allocated_kbit_per_sec: u32) -> f64 {
    if allocated_kbit_per_sec == 0 {
        return f64::INFINITY;
    }
    let kilobytes = file_bytes as f64 / 1000.0;
    let kilobytes_per_sec = allocated_kbit_per_sec as f64 / 8.0;
    (kilobytes / kilobytes_per_sec) * 1000.0
}

/// Project transfer time for every allocated edge, pairing each edge with
/// its projected milliseconds.
pub fn project_all(edges: &[AllocatedEdge], file_bytes: u64) -> Vec<(AllocatedEdge, f64)> {
    edges
        .iter()
        .cloned()
        .map(|edge| {
            let ms = projected_transfer_ms(file_bytes, edge.allocated_bandwidth);
            (edge, ms)
        })
        .collect()
}
