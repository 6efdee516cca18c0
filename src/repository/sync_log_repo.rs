// ==========================================
// 资产主数据导入 - 同步日志 Repository Trait
// ==========================================
// 职责: 定义 sync_logs 表的数据访问接口（不包含实现）
// 红线: 只允许 insert / 进度更新 / 一次性终态写入，不提供删除
// ==========================================

use crate::domain::import_run::{ImportRun, RunCompletion, SyncLogFilter};
use crate::domain::types::RunStatus;
use crate::repository::error::RepositoryResult;
use chrono::{DateTime, Utc};
use async_trait::async_trait;

// ==========================================
// SyncLogRepository Trait
// ==========================================
// 用途: ImportRunTracker 与历史查询使用
// 实现者: SqliteSyncLogRepository（使用 rusqlite）
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    // ===== 生命周期 =====

    /// 插入 running 状态的运行记录
    async fn insert(&self, run: &ImportRun) -> RepositoryResult<()>;

    /// 更新进度（心跳）
    ///
    /// # 说明
    /// - 仅对 running 状态生效，heartbeat_count 自增
    ///
    /// # 返回
    /// - Ok(true): 已更新
    /// - Ok(false): 记录不存在或已是终态
    async fn update_progress(
        &self,
        run_id: &str,
        records_processed: u64,
        records_succeeded: u64,
        errors_count: u64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<bool>;

    /// 写入终态（只允许 running → 终态 一次）
    ///
    /// # 返回
    /// - Err(NotFound): 记录不存在
    /// - Err(InvalidStateTransition): 记录已是终态
    async fn finalize(&self, run_id: &str, completion: &RunCompletion) -> RepositoryResult<()>;

    // ===== 查询 =====

    async fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>>;

    /// 按条件查询，started_at 倒序
    async fn list(&self, filter: &SyncLogFilter) -> RepositoryResult<Vec<ImportRun>>;

    async fn count_by_status(&self, status: RunStatus) -> RepositoryResult<u64>;
}
