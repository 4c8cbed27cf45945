// file: src/utils/telemetry.rs
// description: wall-clock timing of per-object work, reported through tracing fields
// reference: tracing based observability

use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct OperationTimer {
    label: String,
    started: Instant,
}

impl OperationTimer {
    pub fn start(label: impl Into<String>) -> Self {
        let label = label.into();
        debug!(operation = %label, "started");
        Self {
            label,
            started: Instant::now(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        info!(
            operation = %self.label,
            elapsed_ms = elapsed.as_millis() as u64,
            "finished"
        );
        elapsed
    }

    /// Also reports throughput; a zero duration reports zero rather than infinity.
    pub fn finish_with_rows(self, rows: usize) -> Duration {
        let elapsed = self.elapsed();
        let secs = elapsed.as_secs_f64();
        let rows_per_sec = if secs > 0.0 { rows as f64 / secs } else { 0.0 };
        info!(
            operation = %self.label,
            rows,
            elapsed_ms = elapsed.as_millis() as u64,
            rows_per_sec = format!("{:.1}", rows_per_sec),
            "finished"
        );
        elapsed
    }
}
