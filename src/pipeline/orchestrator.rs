// file: src/pipeline/orchestrator.rs
// description: coordinates read, framing, batching, redaction and the single output write per object
// reference: orchestrates the asynchronous redaction workflow for one storage object

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::{ObjectRef, ProcessingResult};
use crate::parser::CsvFramer;
use crate::pipeline::batcher::Batcher;
use crate::pipeline::keys::{KeyRouter, Route};
use crate::pipeline::state::{DocumentState, StateTracker};
use crate::pipeline::stats::StatsTracker;
use crate::redaction::RedactionClient;
use crate::storage::ObjectStore;
use crate::utils::OperationTimer;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Per-invocation state shared by every object processed in it.
#[derive(Debug, Default)]
pub struct InvocationContext {
    pub deadline: Option<Instant>,
    pub stats: StatsTracker,
}

impl InvocationContext {
    pub fn new(deadline: Option<Instant>) -> Self {
        Self {
            deadline,
            stats: StatsTracker::new(),
        }
    }

    pub fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

struct Redaction {
    destination: String,
    rows: usize,
    batches: usize,
    source_sha256: String,
}

pub struct PipelineOrchestrator {
    store: Arc<dyn ObjectStore>,
    client: RedactionClient,
    framer: CsvFramer,
    batcher: Batcher,
    router: KeyRouter,
    max_object_bytes: u64,
}

impl PipelineOrchestrator {
    pub fn new(config: &Config, store: Arc<dyn ObjectStore>, client: RedactionClient) -> Self {
        Self {
            store,
            client,
            framer: CsvFramer::from_config(&config.pipeline),
            batcher: Batcher::new(config.pipeline.batch_size()),
            router: KeyRouter::from_config(&config.pipeline),
            max_object_bytes: config.pipeline.max_object_bytes(),
        }
    }

    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    /// Never returns an error: every failure becomes a `Failed` result for this object only.
    pub async fn process(&self, object: &ObjectRef, ctx: &InvocationContext) -> ProcessingResult {
        let timer = OperationTimer::start(format!("redact {}", object));
        let mut state = StateTracker::new(object.to_string());

        let mut result = match self.router.route(&object.key) {
            Route::Skip(reason) => {
                state.advance(DocumentState::Skipped);
                info!("Skipping {}: {}", object, reason);
                ctx.stats.inc_skipped();
                ProcessingResult::skipped(object, reason.to_string())
            }
            Route::Eligible { destination } => {
                state.advance(DocumentState::Eligible);
                match self.redact_object(object, destination, ctx, &mut state).await {
                    Ok(done) => {
                        ctx.stats.inc_succeeded();
                        info!(
                            "Redacted {} rows of {} to {}",
                            done.rows,
                            object,
                            object.with_key(done.destination.as_str())
                        );
                        let mut result = ProcessingResult::success(
                            object,
                            done.destination,
                            done.rows,
                            done.batches,
                        );
                        result.source_sha256 = Some(done.source_sha256);
                        result
                    }
                    Err(err) => {
                        state.advance(DocumentState::Failed);
                        ctx.stats.inc_failed();
                        if let PipelineError::RedactionFailed { attempts, .. } = &err {
                            ctx.stats.add_oracle_calls(*attempts);
                        }
                        error!("Failed to redact {}: {}", object, err);
                        ProcessingResult::failed(object, &err)
                    }
                }
            }
        };

        result.duration_ms = timer.finish_with_rows(result.rows).as_millis() as u64;
        result
    }

    async fn redact_object(
        &self,
        object: &ObjectRef,
        destination: String,
        ctx: &InvocationContext,
        state: &mut StateTracker,
    ) -> Result<Redaction> {
        let body = self.store.get(&object.bucket, &object.key).await?;
        ctx.stats.add_bytes_read(body.len() as u64);

        if self.max_object_bytes > 0 && body.len() as u64 > self.max_object_bytes {
            warn!("Object too large ({} bytes), rejecting: {}", body.len(), object);
            return Err(PipelineError::Validation(format!(
                "object is {} bytes, limit is {}",
                body.len(),
                self.max_object_bytes
            )));
        }

        let source_sha256 = format!("{:x}", Sha256::digest(&body));
        let document = self.framer.parse(&body)?;
        drop(body);
        state.advance(DocumentState::Parsed);

        let batches = self.batcher.batch(&document.rows);
        let total_batches = batches.len();
        let total_rows = document.row_count();
        state.advance(DocumentState::BatchesPending);
        info!(
            "Processing {}: {} rows in {} batches",
            object, total_rows, total_batches
        );

        let mut redacted = Vec::with_capacity(total_rows);
        for batch in batches {
            if ctx.deadline_passed() {
                return Err(PipelineError::DeadlineExceeded(format!(
                    "stopped before batch {} of {}",
                    batch.index() + 1,
                    total_batches
                )));
            }

            state.advance(DocumentState::Redacting(batch.index()));
            info!(
                "Redacting rows {}-{} of {}",
                batch.offset() + 1,
                batch.offset() + batch.len(),
                object
            );

            let done = self.client.redact(&batch, ctx.deadline).await?;
            ctx.stats.add_oracle_calls(done.attempts);
            redacted.extend(done.rows);
            state.advance(DocumentState::Redacted(batch.index()));
        }

        if redacted.len() != total_rows {
            return Err(PipelineError::ShapeMismatch {
                expected: total_rows,
                actual: redacted.len(),
            });
        }

        let output = document.with_rows(redacted);
        let bytes = self.framer.serialize(&output)?;
        state.advance(DocumentState::Reassembled);

        let written = bytes.len() as u64;
        self.store.put(&object.bucket, &destination, bytes).await?;
        ctx.stats.add_bytes_written(written);
        ctx.stats.add_redacted(total_batches, total_rows);
        state.advance(DocumentState::Written);

        Ok(Redaction {
            destination,
            rows: total_rows,
            batches: total_batches,
            source_sha256,
        })
    }
}
