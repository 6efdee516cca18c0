// ==========================================
// 资产主数据导入 - 内存文件存储
// ==========================================
// 用途: 测试与嵌入式调用（调用方直接持有文件内容）
// ==========================================

use crate::storage::blob_store::{validate_blob_name, BlobStore, StorageError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    download_delay: Option<Duration>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 每次下载前等待指定时长（用于模拟慢速存储）
    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = Some(delay);
        self
    }

    pub fn put(&self, name: &str, bytes: impl Into<Vec<u8>>) -> Result<(), StorageError> {
        validate_blob_name(name)?;
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?;
        blobs.insert(name.to_string(), bytes.into());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(name))
            .unwrap_or(false)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        validate_blob_name(name)?;
        if let Some(delay) = self.download_delay {
            tokio::time::sleep(delay).await;
        }

        let blobs = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?;
        blobs
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Io(std::io::Error::other(e.to_string())))?;
        blobs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }
}
