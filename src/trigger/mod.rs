// file: src/trigger/mod.rs
// description: storage notification intake and per-invocation fan-out
// reference: event driven entry point

mod adapter;
mod event;

pub use adapter::TriggerAdapter;
pub use event::{BucketEntity, EventRecord, ObjectEntity, S3Entity, StorageEvent};
