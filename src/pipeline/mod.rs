// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod batcher;
mod keys;
mod orchestrator;
mod state;
mod stats;

pub use batcher::{Batch, Batcher, Batches};
pub use keys::{KeyRouter, Route, SkipReason};
pub use orchestrator::{InvocationContext, PipelineOrchestrator};
pub use state::{DocumentState, StateTracker};
pub use stats::{PipelineStats, StatsTracker};
