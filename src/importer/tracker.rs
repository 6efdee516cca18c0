// ==========================================
// 资产主数据导入 - 导入运行跟踪器
// ==========================================
// 职责: sync_logs 记录的唯一写入方
// 生命周期:
// - start: 立即持久化 running 记录
// - heartbeat: 尽力而为，失败只记录日志
// - finish: 每条退出路径恰好一次
// ==========================================

use crate::domain::import_run::{ImportRun, RunCompletion};
use crate::domain::types::ImportKind;
use crate::repository::error::RepositoryResult;
use crate::repository::sync_log_repo::SyncLogRepository;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct ImportRunTracker {
    repo: Arc<dyn SyncLogRepository>,
    /// 持久化的错误样本条数上限
    sample_cap: usize,
}

impl ImportRunTracker {
    pub fn new(repo: Arc<dyn SyncLogRepository>, sample_cap: usize) -> Self {
        Self { repo, sample_cap }
    }

    /// 创建 running 状态的运行记录
    ///
    /// # 返回
    /// - Ok(String): run_id
    /// - Err: 存储不可达（调用方按致命错误处理）
    pub async fn start(
        &self,
        kind: ImportKind,
        file_name: &str,
        initiated_by: &str,
    ) -> RepositoryResult<String> {
        let run = ImportRun::start(kind, file_name, initiated_by);
        self.repo.insert(&run).await?;
        info!(run_id = %run.id, kind = %kind, file_name, "导入运行已创建");
        Ok(run.id)
    }

    /// 写入进度心跳；失败不向上传播
    pub async fn heartbeat(
        &self,
        run_id: &str,
        records_processed: u64,
        records_succeeded: u64,
        errors_count: u64,
    ) {
        match self
            .repo
            .update_progress(run_id, records_processed, records_succeeded, errors_count, Utc::now())
            .await
        {
            Ok(true) => debug!(run_id, records_processed, records_succeeded, "心跳已写入"),
            Ok(false) => warn!(run_id, "心跳未生效: 运行记录不存在或已结束"),
            Err(e) => warn!(run_id, error = %e, "心跳写入失败，已忽略"),
        }
    }

    /// 写入终态（错误样本按上限截断）
    pub async fn finish(&self, run_id: &str, mut completion: RunCompletion) -> RepositoryResult<()> {
        completion.error_samples.truncate(self.sample_cap);
        self.repo.finalize(run_id, &completion).await?;
        info!(
            run_id,
            status = %completion.status,
            succeeded = completion.records_succeeded,
            errors = completion.errors_count,
            "导入运行已结束"
        );
        Ok(())
    }

    /// 读取运行记录快照
    pub async fn snapshot(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>> {
        self.repo.find_by_id(run_id).await
    }
}
