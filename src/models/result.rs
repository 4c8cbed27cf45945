// file: src/models/result.rs
// description: per-object and per-invocation processing outcomes
// reference: structured results returned to the event source

use crate::error::{ErrorKind, PipelineError};
use crate::models::ObjectRef;
use crate::pipeline::PipelineStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Success,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub bucket: String,
    pub key: String,
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_key: Option<String>,
    pub rows: usize,
    pub batches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl ProcessingResult {
    fn base(object: &ObjectRef, status: ProcessingStatus) -> Self {
        Self {
            bucket: object.bucket.clone(),
            key: object.key.clone(),
            status,
            reason: None,
            error_kind: None,
            destination_key: None,
            rows: 0,
            batches: 0,
            source_sha256: None,
            duration_ms: 0,
            finished_at: Utc::now(),
        }
    }

    pub fn success(object: &ObjectRef, destination_key: String, rows: usize, batches: usize) -> Self {
        Self {
            destination_key: Some(destination_key),
            rows,
            batches,
            ..Self::base(object, ProcessingStatus::Success)
        }
    }

    pub fn skipped(object: &ObjectRef, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::base(object, ProcessingStatus::Skipped)
        }
    }

    pub fn failed(object: &ObjectRef, error: &PipelineError) -> Self {
        Self {
            reason: Some(error.to_string()),
            error_kind: Some(error.kind()),
            ..Self::base(object, ProcessingStatus::Failed)
        }
    }

    pub fn object(&self) -> ObjectRef {
        ObjectRef::new(self.bucket.clone(), self.key.clone())
    }

    pub fn is_failed(&self) -> bool {
        self.status == ProcessingStatus::Failed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationStatus {
    Success,
    PartialFailure,
    Failure,
}

impl InvocationStatus {
    /// Skips never count against an invocation.
    pub fn from_results(results: &[ProcessingResult]) -> Self {
        let failed = results.iter().filter(|r| r.is_failed()).count();
        let attempted = results
            .iter()
            .filter(|r| r.status != ProcessingStatus::Skipped)
            .count();

        if failed == 0 {
            InvocationStatus::Success
        } else if failed == attempted {
            InvocationStatus::Failure
        } else {
            InvocationStatus::PartialFailure
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResult {
    pub invocation_id: Uuid,
    pub status: InvocationStatus,
    pub results: Vec<ProcessingResult>,
    pub stats: PipelineStats,
}

impl InvocationResult {
    pub fn new(results: Vec<ProcessingResult>, stats: PipelineStats) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            status: InvocationStatus::from_results(&results),
            results,
            stats,
        }
    }
}
