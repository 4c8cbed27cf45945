// file: src/redaction/http.rs
// description: OpenAI-compatible chat completions client for the redaction service
// reference: https://docs.aws.amazon.com/bedrock/latest/userguide/inference-chat-completions.html

use crate::config::OracleConfig;
use crate::error::{PipelineError, Result};
use crate::redaction::oracle::{RedactionOracle, RedactionRequest};
use crate::utils::Validator;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpOracle {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.resolved_endpoint(),
            api_key: config.api_key.clone(),
        })
    }

    fn classify_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> PipelineError {
        let body = Validator::truncate_text(body, 200);
        if status == StatusCode::TOO_MANY_REQUESTS {
            PipelineError::Throttled { retry_after }
        } else if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
            PipelineError::OracleTransient(format!("status {}: {}", status, body))
        } else {
            PipelineError::OracleRejected(format!("status {}: {}", status, body))
        }
    }

    fn extract_text(response: ChatCompletionResponse) -> Result<String> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            PipelineError::OracleFormat("response contained no choices".to_string())
        })?;

        if choice.finish_reason.as_deref() == Some("length") {
            return Err(PipelineError::OracleFormat(
                "response truncated at the max token ceiling".to_string(),
            ));
        }

        choice
            .message
            .content
            .ok_or_else(|| PipelineError::OracleFormat("response message had no content".to_string()))
    }
}

/// `Retry-After` is either delay-seconds or an HTTP-date; dates in the past mean no wait.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

#[async_trait]
impl RedactionOracle for HttpOracle {
    async fn complete(&self, request: &RedactionRequest) -> Result<String> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!(
            "Requesting redaction of {} rows ({} prompt chars)",
            request.expected_rows,
            request.prompt.len()
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body);

        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            PipelineError::OracleTransient(format!("Failed to send redaction request: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| parse_retry_after(v, Utc::now()));
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::classify_status(status, retry_after, &error_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            PipelineError::OracleFormat(format!("Failed to parse redaction response: {}", e))
        })?;

        Self::extract_text(parsed)
    }
}
