// ==========================================
// 资产主数据导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 区域 / 位置 / 资产 参考数据的 CSV 批量导入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 清洗 / 分词 / 校验 / 解析 / 写库
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 文件存储
pub mod storage;

// 安全审计
pub mod audit;

// API 层 - 对外契约
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EntityType, ErrorCategory, ImportKind, RunStage, RunStatus, UpsertOutcome};

// 领域实体
pub use domain::{Caller, ImportError, ImportRequest, ImportRun, ImportSummary, SyncLogFilter};

// 导入引擎
pub use importer::{ImportRunTracker, IngestionEngine, PipelineError};

// API
pub use api::{ApiError, ImportApi, ImportResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "资产主数据导入";
