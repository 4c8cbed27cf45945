// file: src/trigger/adapter.rs
// description: runs the orchestrator over every record of a notification and aggregates the outcome
// reference: concurrent stream processing with bounded parallelism

use crate::config::Config;
use crate::error::PipelineError;
use crate::models::{InvocationResult, ProcessingResult};
use crate::pipeline::{InvocationContext, PipelineOrchestrator};
use crate::trigger::event::{EventRecord, StorageEvent};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub struct TriggerAdapter {
    orchestrator: PipelineOrchestrator,
    parallel_documents: usize,
    timeout: Option<Duration>,
}

impl TriggerAdapter {
    pub fn new(
        orchestrator: PipelineOrchestrator,
        parallel_documents: usize,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            orchestrator,
            parallel_documents: parallel_documents.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &Config, orchestrator: PipelineOrchestrator) -> Self {
        Self::new(
            orchestrator,
            config.pipeline.parallel_documents,
            config.pipeline.invocation_timeout(),
        )
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.orchestrator
    }

    pub async fn handle(&self, event: &StorageEvent) -> InvocationResult {
        let deadline = self.timeout.map(|timeout| Instant::now() + timeout);
        self.handle_with_deadline(event, deadline).await
    }

    /// Results come back in record order regardless of `parallel_documents`.
    pub async fn handle_with_deadline(
        &self,
        event: &StorageEvent,
        deadline: Option<Instant>,
    ) -> InvocationResult {
        let ctx = InvocationContext::new(deadline);
        info!(
            "Handling {} notification records ({} at a time)",
            event.len(),
            self.parallel_documents
        );

        let results: Vec<ProcessingResult> = stream::iter(
            event
                .records
                .iter()
                .map(|record| self.handle_record(record, &ctx)),
        )
        .buffered(self.parallel_documents)
        .collect()
        .await;

        let stats = ctx.stats.get_stats();
        stats.log_summary();

        let result = InvocationResult::new(results, stats);
        info!(
            "Invocation {} finished: {:?}",
            result.invocation_id, result.status
        );
        result
    }

    async fn handle_record(&self, record: &EventRecord, ctx: &InvocationContext) -> ProcessingResult {
        let object = record.object_ref();

        if !record.is_creation() {
            info!("Ignoring {} event for {}", record.event_name(), object);
            ctx.stats.inc_skipped();
            return ProcessingResult::skipped(
                &object,
                format!("event {} is not an object creation", record.event_name()),
            );
        }

        if ctx.deadline_passed() {
            let err = PipelineError::DeadlineExceeded(
                "invocation deadline passed before processing started".to_string(),
            );
            warn!("Not starting {}: {}", object, err);
            ctx.stats.inc_failed();
            return ProcessingResult::failed(&object, &err);
        }

        self.orchestrator.process(&object, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{InvocationStatus, ObjectRef, ProcessingStatus};
    use crate::redaction::testing::StubOracle;
    use crate::redaction::{RedactionClient, Throttle};
    use crate::storage::InMemoryObjectStore;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const BUCKET: &str = "uploads";

    fn adapter(
        config: &Config,
        store: Arc<InMemoryObjectStore>,
        oracle: Arc<StubOracle>,
    ) -> TriggerAdapter {
        let throttle = Arc::new(Throttle::from_config(&config.throttle));
        let client = RedactionClient::from_config(config, oracle, throttle);
        let orchestrator = PipelineOrchestrator::new(config, store, client);
        TriggerAdapter::from_config(config, orchestrator)
    }

    fn test_config() -> Config {
        let mut config = Config::default_config();
        config.pipeline.batch_size = 10;
        config.throttle.inter_call_delay_ms = 0;
        config.retry.base_delay_ms = 10;
        config
    }

    fn event(keys: &[&str]) -> StorageEvent {
        StorageEvent {
            records: keys
                .iter()
                .flat_map(|key| StorageEvent::synthetic(BUCKET, key).records)
                .collect(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_records_keep_order() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.insert(BUCKET, "incoming/a.csv", "name\nalice\n");
        store.insert(BUCKET, "incoming/c.csv", "name\ncarol\n");
        let oracle = Arc::new(StubOracle::identity());
        let adapter = adapter(&test_config(), store.clone(), oracle);

        let result = adapter
            .handle(&event(&[
                "incoming/a.csv",
                "masked/a.csv",
                "incoming/missing.csv",
                "incoming/notes.txt",
                "incoming/c.csv",
            ]))
            .await;

        let statuses: Vec<_> = result.results.iter().map(|r| (r.key.as_str(), r.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("incoming/a.csv", ProcessingStatus::Success),
                ("masked/a.csv", ProcessingStatus::Skipped),
                ("incoming/missing.csv", ProcessingStatus::Failed),
                ("incoming/notes.txt", ProcessingStatus::Skipped),
                ("incoming/c.csv", ProcessingStatus::Success),
            ]
        );
        assert_eq!(result.status, InvocationStatus::PartialFailure);
        assert_eq!(result.stats.objects_succeeded, 2);
        assert_eq!(result.stats.objects_skipped, 2);
        assert_eq!(result.stats.objects_failed, 1);
        assert!(store.contains(BUCKET, "masked/c.csv"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_decoded_keys_are_processed() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.insert(BUCKET, "incoming/q3 report.csv", "name\nalice\n");
        let oracle = Arc::new(StubOracle::identity());
        let adapter = adapter(&test_config(), store.clone(), oracle);
        let event = StorageEvent::from_json(
            r#"{"Records":[{"eventName":"ObjectCreated:Put","s3":{"bucket":{"name":"uploads"},"object":{"key":"incoming/q3+report.csv","size":12}}}]}"#,
        )
        .unwrap();

        let result = adapter.handle(&event).await;

        assert_eq!(result.status, InvocationStatus::Success);
        assert!(store.contains(BUCKET, "masked/q3 report.csv"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_creation_events_skipped() {
        let store = Arc::new(InMemoryObjectStore::new());
        let oracle = Arc::new(StubOracle::identity());
        let adapter = adapter(&test_config(), store.clone(), oracle.clone());
        let mut event = event(&["incoming/a.csv"]);
        event.records[0].event_name = Some("ObjectRemoved:Delete".to_string());

        let result = adapter.handle(&event).await;

        assert_eq!(result.results[0].status, ProcessingStatus::Skipped);
        assert_eq!(result.status, InvocationStatus::Success);
        assert!(store.operations().is_empty());
        assert_eq!(oracle.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_passed_deadline_starts_nothing() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.insert(BUCKET, "incoming/a.csv", "name\nalice\n");
        let oracle = Arc::new(StubOracle::identity());
        let adapter = adapter(&test_config(), store.clone(), oracle.clone());

        let result = adapter
            .handle_with_deadline(
                &event(&["incoming/a.csv", "incoming/b.csv"]),
                Some(Instant::now()),
            )
            .await;

        assert_eq!(result.status, InvocationStatus::Failure);
        assert!(
            result
                .results
                .iter()
                .all(|r| r.error_kind == Some(ErrorKind::DeadlineExceeded))
        );
        assert!(store.operations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_parallel_documents_share_throttle() {
        let store = Arc::new(InMemoryObjectStore::new());
        for key in ["incoming/a.csv", "incoming/b.csv", "incoming/c.csv"] {
            store.insert(BUCKET, key, "name\nx\n");
        }
        let oracle = Arc::new(StubOracle::identity());
        let mut config = test_config();
        config.pipeline.parallel_documents = 3;
        config.throttle.inter_call_delay_ms = 500;
        let adapter = adapter(&config, store.clone(), oracle.clone());

        let result = adapter
            .handle(&event(&["incoming/a.csv", "incoming/b.csv", "incoming/c.csv"]))
            .await;

        assert_eq!(result.status, InvocationStatus::Success);
        let mut times: Vec<_> = oracle.calls().iter().map(|c| c.at).collect();
        times.sort();
        assert_eq!(times.len(), 3);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
        assert_eq!(
            result.results.iter().map(|r| r.object()).collect::<Vec<_>>(),
            vec![
                ObjectRef::new(BUCKET, "incoming/a.csv"),
                ObjectRef::new(BUCKET, "incoming/b.csv"),
                ObjectRef::new(BUCKET, "incoming/c.csv"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_failing_is_failure() {
        let store = Arc::new(InMemoryObjectStore::new());
        store.insert(BUCKET, "incoming/a.csv", "name\nalice\n");
        let oracle = Arc::new(StubOracle::new(|_, _| {
            Err(PipelineError::OracleRejected("status 403".to_string()))
        }));
        let adapter = adapter(&test_config(), store.clone(), oracle);

        let result = adapter.handle(&event(&["incoming/a.csv", "masked/a.csv"])).await;

        assert_eq!(result.status, InvocationStatus::Failure);
        assert_eq!(result.stats.oracle_calls, 1);
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_event_succeeds() {
        let store = Arc::new(InMemoryObjectStore::new());
        let oracle = Arc::new(StubOracle::identity());
        let adapter = adapter(&test_config(), store, oracle);

        let result = adapter.handle(&StorageEvent::default()).await;

        assert_eq!(result.status, InvocationStatus::Success);
        assert!(result.results.is_empty());
    }
}
