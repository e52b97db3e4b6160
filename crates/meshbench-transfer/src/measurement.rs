//! Per-receiver timing measurement (§4.4.1)

use std::time::{Duration, Instant};

/// Timing recorded by a single receiver for one completed transfer.
///
/// `connection_duration = completion_instant - attempt_start -
/// file_transfer_duration`; `file_transfer_duration = byte_stream_end -
/// byte_stream_start`; `total_duration = connection_duration +
/// file_transfer_duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionMeasurement {
    pub connection_duration: Duration,
    pub file_transfer_duration: Duration,
    pub total_duration: Duration,
}

impl ConnectionMeasurement {
    /// Compute the measurement from the three instants a receiver
    /// observes: when it started attempting to connect, when byte
    /// streaming began, and when it ended.
    pub fn from_instants(attempt_start: Instant, byte_stream_start: Instant, byte_stream_end: Instant) -> Self {
        let file_transfer_duration = byte_stream_end.saturating_duration_since(byte_stream_start);
        let completion_instant = byte_stream_end;
        let connection_duration =
            completion_instant.saturating_duration_since(attempt_start).saturating_sub(file_transfer_duration);
        Self {
            connection_duration,
            file_transfer_duration,
            total_duration: connection_duration + file_transfer_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_duration_is_the_sum_of_its_parts() {
        let attempt_start = Instant::now();
        let byte_stream_start = attempt_start + Duration::from_millis(50);
        let byte_stream_end = byte_stream_start + Duration::from_millis(200);

        let measurement = ConnectionMeasurement::from_instants(attempt_start, byte_stream_start, byte_stream_end);
        assert_eq!(measurement.file_transfer_duration, Duration::from_millis(200));
        assert_eq!(measurement.connection_duration, Duration::from_millis(50));
        assert_eq!(measurement.total_duration, Duration::from_millis(250));
    }
}
