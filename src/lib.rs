// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod redaction;
pub mod storage;
pub mod trigger;
pub mod utils;

pub use config::{
    Config, OracleConfig, PipelineConfig, RetryConfig, StorageConfig, ThrottleConfig,
    UnprefixedKeyPolicy,
};
pub use error::{ErrorKind, PipelineError, Result};
pub use models::{
    CsvDocument, DataRow, InvocationResult, InvocationStatus, ObjectRef, ProcessingResult,
    ProcessingStatus,
};
pub use parser::CsvFramer;
pub use pipeline::{
    Batcher, InvocationContext, KeyRouter, PipelineOrchestrator, PipelineStats, StatsTracker,
};
pub use redaction::{HttpOracle, RedactionClient, RedactionOracle, RetryPolicy, Throttle};
pub use storage::{InMemoryObjectStore, LocalObjectStore, ObjectStore};
pub use trigger::{StorageEvent, TriggerAdapter};
pub use utils::{OperationTimer, Validator};
