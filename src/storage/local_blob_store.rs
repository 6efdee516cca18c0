// ==========================================
// 资产主数据导入 - 本地目录文件存储
// ==========================================

use crate::storage::blob_store::{validate_blob_name, BlobStore, StorageError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 上传目录环境变量
pub const UPLOAD_DIR_ENV: &str = "ASSET_IMPORT_UPLOAD_DIR";

/// 以本地目录作为上传区
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 默认上传目录: 环境变量 > 用户数据目录/asset-import/uploads > ./uploads
    pub fn default_root() -> PathBuf {
        if let Ok(dir) = std::env::var(UPLOAD_DIR_ENV) {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        dirs::data_dir()
            .map(|d| d.join("asset-import").join("uploads"))
            .unwrap_or_else(|| PathBuf::from("./uploads"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_blob_name(name)?;
        Ok(self.root.join(name.trim()))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(name.to_string())),
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}
