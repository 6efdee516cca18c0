// ==========================================
// 资产主数据导入 - 文件存储 Trait
// ==========================================
// 职责: 定义 "按名称下载字节 / 按名称删除" 接口
// ==========================================

use async_trait::async_trait;
use thiserror::Error;

/// 文件存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("文件不存在: {0}")]
    NotFound(String),

    #[error("非法文件名: {0}")]
    InvalidName(String),

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),
}

// ==========================================
// BlobStore Trait
// ==========================================
// 实现者: LocalBlobStore, InMemoryBlobStore
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// 下载文件全部字节
    async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// 删除文件
    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// 校验存储对象名：以 "/" 分隔的相对路径，各段非空，不含 ".." 与反斜杠
pub fn validate_blob_name(name: &str) -> Result<(), StorageError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.split('/').any(|segment| segment.is_empty())
        || trimmed.contains('\\')
        || trimmed.contains("..")
        || trimmed.contains('\0')
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
