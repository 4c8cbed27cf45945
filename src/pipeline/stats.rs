// file: src/pipeline/stats.rs
// description: invocation statistics collected while objects are processed
// reference: atomic counters snapshotted into a serializable summary

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub objects_succeeded: usize,
    pub objects_skipped: usize,
    pub objects_failed: usize,
    pub rows_redacted: usize,
    pub batches_redacted: usize,
    pub oracle_calls: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub duration_ms: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows_per_second(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.rows_redacted as f64 * 1000.0 / self.duration_ms as f64
    }

    /// Share of attempted (non-skipped) objects that were written.
    pub fn success_rate(&self) -> f64 {
        let total = self.objects_succeeded + self.objects_failed;
        if total == 0 {
            return 0.0;
        }
        (self.objects_succeeded as f64 / total as f64) * 100.0
    }

    pub fn log_summary(&self) {
        info!("=== Redaction Invocation Summary ===");
        info!("Duration: {} ms", self.duration_ms);
        info!("Objects redacted: {}", self.objects_succeeded);
        info!("Objects skipped: {}", self.objects_skipped);
        info!("Objects failed: {}", self.objects_failed);
        info!("Success rate: {:.2}%", self.success_rate());
        info!(
            "Rows redacted: {} in {} batches ({} oracle calls)",
            self.rows_redacted, self.batches_redacted, self.oracle_calls
        );
        info!("Bytes read/written: {}/{}", self.bytes_read, self.bytes_written);
        info!("Throughput: {:.2} rows/sec", self.rows_per_second());
        info!("====================================");
    }
}

#[derive(Debug)]
pub struct StatsTracker {
    objects_succeeded: AtomicUsize,
    objects_skipped: AtomicUsize,
    objects_failed: AtomicUsize,
    rows_redacted: AtomicUsize,
    batches_redacted: AtomicUsize,
    oracle_calls: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    start_time: Instant,
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            objects_succeeded: AtomicUsize::new(0),
            objects_skipped: AtomicUsize::new(0),
            objects_failed: AtomicUsize::new(0),
            rows_redacted: AtomicUsize::new(0),
            batches_redacted: AtomicUsize::new(0),
            oracle_calls: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn inc_succeeded(&self) {
        self.objects_succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_skipped(&self) {
        self.objects_skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn inc_failed(&self) {
        self.objects_failed.fetch_add(1, Ordering::SeqCst);
    }

    /// Only called once a redacted document has been written.
    pub fn add_redacted(&self, batches: usize, rows: usize) {
        self.batches_redacted.fetch_add(batches, Ordering::SeqCst);
        self.rows_redacted.fetch_add(rows, Ordering::SeqCst);
    }

    pub fn add_oracle_calls(&self, calls: u32) {
        self.oracle_calls.fetch_add(u64::from(calls), Ordering::SeqCst);
    }

    pub fn add_bytes_read(&self, bytes: u64) {
        self.bytes_read.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn add_bytes_written(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            objects_succeeded: self.objects_succeeded.load(Ordering::SeqCst),
            objects_skipped: self.objects_skipped.load(Ordering::SeqCst),
            objects_failed: self.objects_failed.load(Ordering::SeqCst),
            rows_redacted: self.rows_redacted.load(Ordering::SeqCst),
            batches_redacted: self.batches_redacted.load(Ordering::SeqCst),
            oracle_calls: self.oracle_calls.load(Ordering::SeqCst),
            bytes_read: self.bytes_read.load(Ordering::SeqCst),
            bytes_written: self.bytes_written.load(Ordering::SeqCst),
            duration_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }
}
