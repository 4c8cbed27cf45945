// file: src/storage/mod.rs
// description: object storage abstraction and backends
// reference: internal module structure

mod local;
mod memory;

pub use local::LocalObjectStore;
pub use memory::{InMemoryObjectStore, StorageOp};

use crate::error::Result;
use async_trait::async_trait;

/// Bucket/key addressed blob storage that triggers and receives redaction work.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Replaces the whole object; readers never observe a partial body.
    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}
