// file: src/storage/memory.rs
// description: in-memory object store with operation tracing and failure injection
// reference: test storage backends that record every operation

use crate::error::{PipelineError, Result};
use crate::storage::ObjectStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Record of a storage operation for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    Get { bucket: String, key: String },
    Put { bucket: String, key: String, size: usize },
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
    operations: Arc<Mutex<Vec<StorageOp>>>,
    fail_keys: Arc<Mutex<Vec<String>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, body: impl Into<Vec<u8>>) {
        self.lock_objects()
            .insert((bucket.to_string(), key.to_string()), body.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock_objects()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object(bucket, key).is_some()
    }

    pub fn operations(&self) -> Vec<StorageOp> {
        self.operations
            .lock()
            .map(|ops| ops.clone())
            .unwrap_or_default()
    }

    pub fn put_count(&self) -> usize {
        self.operations()
            .iter()
            .filter(|op| matches!(op, StorageOp::Put { .. }))
            .count()
    }

    /// Any operation on a key starting with `prefix` fails.
    pub fn inject_failure(&self, prefix: impl Into<String>) {
        if let Ok(mut fail_keys) = self.fail_keys.lock() {
            fail_keys.push(prefix.into());
        }
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), Vec<u8>>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, op: StorageOp) {
        if let Ok(mut operations) = self.operations.lock() {
            operations.push(op);
        }
    }

    fn check_failure(&self, bucket: &str, key: &str) -> Result<()> {
        let injected = self
            .fail_keys
            .lock()
            .map(|keys| keys.iter().any(|prefix| key.starts_with(prefix.as_str())))
            .unwrap_or(false);

        if injected {
            return Err(PipelineError::storage(bucket, key, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.record(StorageOp::Get {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        self.check_failure(bucket, key)?;

        self.object(bucket, key)
            .ok_or_else(|| PipelineError::storage(bucket, key, "no such object"))
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.record(StorageOp::Put {
            bucket: bucket.to_string(),
            key: key.to_string(),
            size: body.len(),
        });
        self.check_failure(bucket, key)?;

        self.insert(bucket, key, body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_operations() {
        let store = InMemoryObjectStore::new();
        store.insert("uploads", "incoming/a.csv", "a\n1\n");

        let body = store.get("uploads", "incoming/a.csv").await.unwrap();
        store.put("uploads", "masked/a.csv", body).await.unwrap();

        assert_eq!(
            store.operations(),
            vec![
                StorageOp::Get {
                    bucket: "uploads".to_string(),
                    key: "incoming/a.csv".to_string(),
                },
                StorageOp::Put {
                    bucket: "uploads".to_string(),
                    key: "masked/a.csv".to_string(),
                    size: 4,
                },
            ]
        );
        assert!(store.contains("uploads", "masked/a.csv"));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = InMemoryObjectStore::new();
        store.insert("uploads", "incoming/a.csv", "a\n");
        store.inject_failure("masked/");

        assert!(store.get("uploads", "incoming/a.csv").await.is_ok());
        assert!(store.put("uploads", "masked/a.csv", vec![]).await.is_err());
        assert!(!store.contains("uploads", "masked/a.csv"));
    }

    #[tokio::test]
    async fn test_missing_object() {
        let store = InMemoryObjectStore::new();
        assert!(store.get("uploads", "nope.csv").await.is_err());
    }
}
