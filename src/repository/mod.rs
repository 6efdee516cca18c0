// ==========================================
// 资产主数据导入 - 数据仓储层
// ==========================================
// 职责: 数据访问，不含业务逻辑
// 技术: rusqlite + async-trait
// ==========================================

pub mod error;
pub mod reference_store;
pub mod reference_store_impl;
pub mod sync_log_repo;
pub mod sync_log_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use reference_store::{ReferenceCounts, ReferenceEntry, ReferenceStore};
pub use reference_store_impl::SqliteReferenceStore;
pub use sync_log_repo::SyncLogRepository;
pub use sync_log_repo_impl::SqliteSyncLogRepository;
