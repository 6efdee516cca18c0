// ==========================================
// 资产主数据导入 - API层错误类型
// ==========================================
// 职责: 将管道 / 仓储错误转换为带状态码的对外错误
// 约束: 对外消息不暴露内部细节（路径、SQL、堆栈）
// ==========================================

use crate::importer::error::{PipelineError, GENERIC_FAILURE_MESSAGE};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方错误
    // ==========================================
    #[error("未认证: {0}")]
    Unauthorized(String),

    #[error("权限不足: {0}")]
    Forbidden(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("请求内容过大: {0}")]
    PayloadTooLarge(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 上游 / 基础设施错误
    // ==========================================
    #[error("上游超时: {0}")]
    UpstreamTimeout(String),

    #[error("服务不可用: {0}")]
    ServiceUnavailable(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// HTTP 语义的状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::InvalidInput(_) => 400,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::NotFound(_) => 404,
            ApiError::InvalidStateTransition { .. } => 409,
            ApiError::UpstreamTimeout(_) => 504,
            ApiError::ServiceUnavailable(_) => 503,
            ApiError::DatabaseError(_) | ApiError::InternalError(_) => 500,
        }
    }

    /// 对外消息
    ///
    /// # 说明
    /// - 调用方错误: 原样返回（构造时已是安全文本）
    /// - 其余: 统一为通用失败提示
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::InvalidInput(msg)
            | ApiError::PayloadTooLarge(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

// ==========================================
// 从 PipelineError 转换
// ==========================================
impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let message = err.public_message();
        match err {
            PipelineError::Unauthenticated => ApiError::Unauthorized(message),
            PipelineError::Forbidden(_) => ApiError::Forbidden(message),
            PipelineError::MissingFileName
            | PipelineError::InvalidFileName(_)
            | PipelineError::InvalidEncoding(_)
            | PipelineError::EmptyFile
            | PipelineError::MissingHeaders(_) => ApiError::InvalidInput(message),
            PipelineError::FileNotFound(_) => ApiError::NotFound(message),
            PipelineError::FileTooLarge { .. }
            | PipelineError::TextTooLarge { .. }
            | PipelineError::TooManyRows { .. } => ApiError::PayloadTooLarge(message),
            PipelineError::DownloadTimeout { .. } => ApiError::UpstreamTimeout(err.to_string()),
            PipelineError::DownloadFailed(detail) | PipelineError::StoreUnavailable(detail) => {
                ApiError::ServiceUnavailable(detail)
            }
            PipelineError::Internal(detail) => ApiError::InternalError(detail),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {} not found", entity, id))
            }
            RepositoryError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("{}: {}", field, message))
            }
            RepositoryError::LockError(msg)
            | RepositoryError::Busy(msg) => ApiError::ServiceUnavailable(msg),
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_status_codes() {
        let cases = [
            (PipelineError::Unauthenticated, 401),
            (PipelineError::Forbidden("u1".into()), 403),
            (PipelineError::InvalidFileName("../x".into()), 400),
            (PipelineError::TooManyRows { rows: 2, limit: 1 }, 413),
            (PipelineError::FileNotFound("a.csv".into()), 404),
            (PipelineError::DownloadTimeout { timeout_ms: 30_000 }, 504),
            (PipelineError::StoreUnavailable("locked".into()), 503),
            (PipelineError::Internal("panic".into()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(ApiError::from(err).status_code(), code);
        }
    }

    #[test]
    fn test_infrastructure_errors_use_generic_message() {
        let err = ApiError::from(PipelineError::StoreUnavailable("/var/db/x.db locked".into()));
        assert_eq!(err.public_message(), GENERIC_FAILURE_MESSAGE);

        let err = ApiError::from(PipelineError::MissingHeaders(vec!["name".into()]));
        assert_eq!(err.public_message(), "Missing required headers: name");
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = ApiError::from(RepositoryError::NotFound {
            entity: "sync_log".into(),
            id: "r1".into(),
        });
        assert_eq!(err.status_code(), 404);
    }
}
