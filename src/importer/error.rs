// ==========================================
// 资产主数据导入 - 导入管道错误类型
// ==========================================
// 分级:
// - 致命错误（本类型）: 运行直接 failed，不写任何行
// - 行级错误: domain::ImportError，只计数与采样，不中断运行
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use crate::storage::StorageError;
use thiserror::Error;

/// 对外统一的失败提示（不暴露内部细节）
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Processing failed. Please check your file format and try again.";

/// 导入管道致命错误
#[derive(Error, Debug)]
pub enum PipelineError {
    // ===== 权限 =====
    #[error("未认证的调用")]
    Unauthenticated,

    #[error("权限不足: user_id={0}")]
    Forbidden(String),

    // ===== 文件 =====
    #[error("缺少文件名")]
    MissingFileName,

    #[error("非法文件名: {0}")]
    InvalidFileName(String),

    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件下载失败: {0}")]
    DownloadFailed(String),

    #[error("文件下载超时: {timeout_ms}ms")]
    DownloadTimeout { timeout_ms: u64 },

    #[error("文件过大: {size} 字节 (上限 {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("文本内容过大: {size} 字节 (上限 {limit})")]
    TextTooLarge { size: u64, limit: u64 },

    #[error("文件不是合法的 UTF-8 文本: {0}")]
    InvalidEncoding(String),

    // ===== 内容结构 =====
    #[error("文件没有数据行")]
    EmptyFile,

    #[error("数据行过多: {rows} (上限 {limit})")]
    TooManyRows { rows: usize, limit: usize },

    #[error("缺少必需表头: {0:?}")]
    MissingHeaders(Vec<String>),

    // ===== 基础设施 =====
    #[error("存储不可用: {0}")]
    StoreUnavailable(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl PipelineError {
    /// 对外提示；调用方可自行修正的错误给出具体原因，其余统一为通用提示
    pub fn public_message(&self) -> String {
        match self {
            PipelineError::Unauthenticated => "Authentication required".to_string(),
            PipelineError::Forbidden(_) => {
                "Insufficient permissions. Admin or manager role required.".to_string()
            }
            PipelineError::MissingFileName => "File name is required".to_string(),
            PipelineError::InvalidFileName(_) => "Invalid file name".to_string(),
            PipelineError::FileNotFound(_) => "File not found".to_string(),
            PipelineError::FileTooLarge { limit, .. } => {
                format!("File too large (max {}MB)", limit / (1024 * 1024))
            }
            PipelineError::TextTooLarge { limit, .. } => {
                format!("CSV content too large to process (max {}MB)", limit / (1024 * 1024))
            }
            PipelineError::TooManyRows { limit, .. } => {
                format!("CSV contains too many rows (max {})", limit)
            }
            PipelineError::EmptyFile => "CSV file contains no data rows".to_string(),
            PipelineError::MissingHeaders(headers) => {
                format!("Missing required headers: {}", headers.join(", "))
            }
            PipelineError::InvalidEncoding(_)
            | PipelineError::DownloadFailed(_)
            | PipelineError::DownloadTimeout { .. }
            | PipelineError::StoreUnavailable(_)
            | PipelineError::Internal(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// 是否为超限类错误（触发 oversized_file_attempt 审计）
    pub fn is_oversize(&self) -> bool {
        matches!(
            self,
            PipelineError::FileTooLarge { .. }
                | PipelineError::TextTooLarge { .. }
                | PipelineError::TooManyRows { .. }
        )
    }
}

// 实现 From<StorageError>
impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(name) => PipelineError::FileNotFound(name),
            StorageError::InvalidName(name) => PipelineError::InvalidFileName(name),
            StorageError::Io(e) => PipelineError::DownloadFailed(e.to_string()),
        }
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for PipelineError {
    fn from(err: RepositoryError) -> Self {
        PipelineError::StoreUnavailable(err.to_string())
    }
}

/// Result 类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_message_hides_internals() {
        let err = PipelineError::StoreUnavailable("disk I/O error at /var/db".to_string());
        assert_eq!(err.public_message(), GENERIC_FAILURE_MESSAGE);

        let err = PipelineError::MissingHeaders(vec!["name".into(), "erp_asset_id".into()]);
        assert_eq!(err.public_message(), "Missing required headers: name, erp_asset_id");
    }

    #[test]
    fn test_storage_error_mapping() {
        let err: PipelineError = StorageError::NotFound("a.csv".into()).into();
        assert!(matches!(err, PipelineError::FileNotFound(_)));
    }

    #[test]
    fn test_oversize_classification() {
        assert!(PipelineError::TooManyRows { rows: 11, limit: 10 }.is_oversize());
        assert!(!PipelineError::EmptyFile.is_oversize());
    }
}
