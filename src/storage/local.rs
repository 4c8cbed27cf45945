// file: src/storage/local.rs
// description: filesystem backed object store, one directory per bucket
// reference: temp file plus rename for atomic replacement

use crate::error::{PipelineError, Result};
use crate::storage::ObjectStore;
use crate::utils::Validator;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        Validator::validate_bucket_name(bucket)?;
        Validator::validate_object_key(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("object path has no parent directory"))?;
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(body)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        debug!("Reading object from {}", path.display());

        tokio::fs::read(&path)
            .await
            .map_err(|e| PipelineError::storage(bucket, key, e.to_string()))
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        debug!("Writing {} bytes to {}", body.len(), path.display());

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&target, &body))
            .await
            .map_err(|e| PipelineError::storage(bucket, key, format!("write task failed: {}", e)))?
            .map_err(|e| PipelineError::storage(bucket, key, e.to_string()))
    }
}
