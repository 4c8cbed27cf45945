// file: src/redaction/mod.rs
// description: redaction module exports
// reference: internal module structure

mod client;
mod http;
mod oracle;
mod prompt;
mod throttle;

#[cfg(test)]
pub mod testing;

pub use client::{RedactedBatch, RedactionClient, RetryPolicy};
pub use http::HttpOracle;
pub use oracle::{RedactionOracle, RedactionRequest};
pub use prompt::PromptTemplate;
pub use throttle::Throttle;
