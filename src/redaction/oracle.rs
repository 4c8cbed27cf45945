// file: src/redaction/oracle.rs
// description: interface to the external language-model redaction service
// reference: injected async collaborators behind a trait object

use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;

/// One round-trip to the oracle: a single user message, deterministic sampling.
#[derive(Debug, Clone, Serialize)]
pub struct RedactionRequest {
    pub model: String,
    pub prompt: String,
    pub batch_csv: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub expected_rows: usize,
    pub expected_columns: usize,
    pub strict: bool,
}

#[async_trait]
pub trait RedactionOracle: Send + Sync {
    /// Returns the raw response text, expected to be header-less CSV.
    async fn complete(&self, request: &RedactionRequest) -> Result<String>;
}
