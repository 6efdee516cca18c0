// ==========================================
// 资产主数据导入 - API 层
// ==========================================
// 职责: 对外请求 / 响应契约，供命令行或服务宿主调用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{
    write_error_report, ImportApi, ImportDetails, ImportResponse, ImportResponseBody,
};
