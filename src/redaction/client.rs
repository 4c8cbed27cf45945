// file: src/redaction/client.rs
// description: sends batches to the redaction oracle, validates shape and retries failures
// reference: paced, bounded-retry calls to an external text-transform service

use crate::config::{Config, RetryConfig};
use crate::error::{PipelineError, Result};
use crate::models::DataRow;
use crate::parser::CsvFramer;
use crate::pipeline::Batch;
use crate::redaction::oracle::{RedactionOracle, RedactionRequest};
use crate::redaction::prompt::PromptTemplate;
use crate::redaction::throttle::Throttle;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep, timeout, timeout_at};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (1 based): `base * 2^(retry-1)`, capped.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Redacted rows of one batch and the oracle attempts it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactedBatch {
    pub rows: Vec<DataRow>,
    pub attempts: u32,
}

pub struct RedactionClient {
    oracle: Arc<dyn RedactionOracle>,
    throttle: Arc<Throttle>,
    policy: RetryPolicy,
    template: PromptTemplate,
    model: String,
    max_tokens: u32,
    call_timeout: Duration,
}

impl RedactionClient {
    pub fn new(
        oracle: Arc<dyn RedactionOracle>,
        throttle: Arc<Throttle>,
        policy: RetryPolicy,
        model: String,
        max_tokens: u32,
        call_timeout: Duration,
    ) -> Self {
        Self {
            oracle,
            throttle,
            policy,
            template: PromptTemplate::new(),
            model,
            max_tokens,
            call_timeout,
        }
    }

    pub fn from_config(
        config: &Config,
        oracle: Arc<dyn RedactionOracle>,
        throttle: Arc<Throttle>,
    ) -> Self {
        Self::new(
            oracle,
            throttle,
            RetryPolicy::from_config(&config.retry),
            config.oracle.model.clone(),
            config.oracle.max_tokens,
            config.oracle.timeout(),
        )
    }

    /// Redacts one batch, returning exactly as many rows as the batch holds.
    pub async fn redact(&self, batch: &Batch<'_>, deadline: Option<Instant>) -> Result<RedactedBatch> {
        let batch_csv = CsvFramer::serialize_rows(batch.rows())?;
        let max_attempts = self.policy.max_attempts();
        let mut strict = false;
        let mut format_retry_used = false;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let request = self.build_request(&batch_csv, batch, strict);

            let mut dispatched = false;
            let call = async {
                self.throttle.await_slot().await;
                dispatched = true;
                timeout(self.call_timeout, self.oracle.complete(&request)).await
            };

            // The deadline bounds the slot wait as well as the call itself.
            let response = match deadline {
                Some(deadline) => timeout_at(deadline, call).await.ok(),
                None => Some(call.await),
            };

            let outcome = match response {
                None => {
                    return Err(PipelineError::RedactionFailed {
                        attempts: attempt - 1 + u32::from(dispatched),
                        last: Box::new(PipelineError::DeadlineExceeded(format!(
                            "deadline reached during attempt {} of batch {}",
                            attempt,
                            batch.index()
                        ))),
                    });
                }
                Some(Ok(response)) => response.and_then(|text| Self::parse_response(&text, batch)),
                Some(Err(_)) => Err(PipelineError::OracleTransient(format!(
                    "oracle call timed out after {}s",
                    self.call_timeout.as_secs_f64()
                ))),
            };

            let err = match outcome {
                Ok(rows) => {
                    debug!(
                        "Batch {} redacted on attempt {} ({} rows)",
                        batch.index(),
                        attempt,
                        rows.len()
                    );
                    return Ok(RedactedBatch {
                        rows,
                        attempts: attempt,
                    });
                }
                Err(err) => err,
            };

            let format_exhausted = matches!(err, PipelineError::OracleFormat(_)) && format_retry_used;
            if attempt >= max_attempts || !err.is_retryable() || format_exhausted {
                return Err(PipelineError::RedactionFailed {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = match &err {
                PipelineError::Throttled { retry_after } => {
                    let delay = retry_after
                        .unwrap_or_default()
                        .max(self.policy.backoff(attempt));
                    self.throttle.defer(delay).await;
                    delay
                }
                PipelineError::OracleTransient(_) => self.policy.backoff(attempt),
                PipelineError::OracleFormat(_) => {
                    format_retry_used = true;
                    strict = true;
                    Duration::ZERO
                }
                _ => {
                    strict = true;
                    Duration::ZERO
                }
            };

            if let Some(deadline) = deadline
                && Instant::now() + delay >= deadline
            {
                return Err(PipelineError::RedactionFailed {
                    attempts: attempt,
                    last: Box::new(PipelineError::DeadlineExceeded(format!(
                        "no time left to retry batch {} after: {}",
                        batch.index(),
                        err
                    ))),
                });
            }

            warn!(
                "Batch {} attempt {}/{} failed: {}; retrying in {}ms",
                batch.index(),
                attempt,
                max_attempts,
                err,
                delay.as_millis()
            );

            if !delay.is_zero() {
                sleep(delay).await;
            }
        }
    }

    fn build_request(&self, batch_csv: &str, batch: &Batch<'_>, strict: bool) -> RedactionRequest {
        RedactionRequest {
            model: self.model.clone(),
            prompt: self
                .template
                .render(batch_csv, batch.len(), batch.width(), strict),
            batch_csv: batch_csv.to_string(),
            temperature: 0.0,
            max_tokens: self.max_tokens,
            expected_rows: batch.len(),
            expected_columns: batch.width(),
            strict,
        }
    }

    /// Row count must match exactly; each row must keep its input row's field count.
    fn parse_response(text: &str, batch: &Batch<'_>) -> Result<Vec<DataRow>> {
        let trimmed = text.trim_matches(|c: char| c == '\n' || c == '\r');
        let rows = CsvFramer::parse_records(trimmed)
            .map_err(|e| PipelineError::OracleFormat(e.to_string()))?;

        if rows.len() != batch.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: batch.len(),
                actual: rows.len(),
            });
        }

        for (i, (redacted, original)) in rows.iter().zip(batch.rows()).enumerate() {
            if redacted.len() != original.len() {
                return Err(PipelineError::OracleFormat(format!(
                    "response row {} has {} fields, expected {}",
                    i + 1,
                    redacted.len(),
                    original.len()
                )));
            }
        }

        Ok(rows)
    }
}
