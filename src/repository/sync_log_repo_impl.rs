// ==========================================
// 资产主数据导入 - 同步日志 Repository 实现
// ==========================================
// 职责: 基于 rusqlite 的 sync_logs 读写
// 状态机: 终态写入使用 WHERE status = 'running' 保证只发生一次
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import_run::{ImportRun, RunCompletion, SyncLogFilter};
use crate::domain::record::ImportError;
use crate::domain::types::{RunStage, RunStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sync_log_repo::SyncLogRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = r#"
    id, import_kind, status, file_name, initiated_by, started_at, completed_at,
    records_processed, records_succeeded, errors_count, heartbeat_count,
    last_heartbeat_at, error_samples, failure_reason, failed_stage, processing_time_ms
"#;

// ==========================================
// SqliteSyncLogRepository
// ==========================================
pub struct SqliteSyncLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSyncLogRepository {
    /// 创建新的 Repository 实例（确保 schema 就绪）
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn parse_column<T: FromStr>(row: &Row, idx: usize) -> rusqlite::Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let raw: String = row.get(idx)?;
        T::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
            )
        })
    }

    fn map_row(row: &Row) -> rusqlite::Result<ImportRun> {
        let samples_json: String = row.get(12)?;
        let error_samples: Vec<ImportError> = serde_json::from_str(&samples_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?;

        let failed_stage = match row.get::<_, Option<String>>(14)? {
            Some(raw) => Some(RunStage::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    14,
                    Type::Text,
                    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
                )
            })?),
            None => None,
        };

        Ok(ImportRun {
            id: row.get(0)?,
            import_kind: Self::parse_column(row, 1)?,
            status: Self::parse_column(row, 2)?,
            file_name: row.get(3)?,
            initiated_by: row.get(4)?,
            started_at: row.get(5)?,
            completed_at: row.get(6)?,
            records_processed: row.get::<_, i64>(7)?.max(0) as u64,
            records_succeeded: row.get::<_, i64>(8)?.max(0) as u64,
            errors_count: row.get::<_, i64>(9)?.max(0) as u64,
            heartbeat_count: row.get::<_, i64>(10)?.max(0) as u64,
            last_heartbeat_at: row.get(11)?,
            error_samples,
            failure_reason: row.get(13)?,
            failed_stage,
            processing_time_ms: row.get(15)?,
        })
    }
}

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn insert(&self, run: &ImportRun) -> RepositoryResult<()> {
        let samples_json = serde_json::to_string(&run.error_samples)?;
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO sync_logs (
                id, import_kind, status, file_name, initiated_by, started_at, completed_at,
                records_processed, records_succeeded, errors_count, heartbeat_count,
                last_heartbeat_at, error_samples, failure_reason, failed_stage, processing_time_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                run.id,
                run.import_kind.as_str(),
                run.status.as_str(),
                run.file_name,
                run.initiated_by,
                run.started_at,
                run.completed_at,
                run.records_processed as i64,
                run.records_succeeded as i64,
                run.errors_count as i64,
                run.heartbeat_count as i64,
                run.last_heartbeat_at,
                samples_json,
                run.failure_reason,
                run.failed_stage.map(|s| s.as_str()),
                run.processing_time_ms,
            ],
        )?;
        Ok(())
    }

    async fn update_progress(
        &self,
        run_id: &str,
        records_processed: u64,
        records_succeeded: u64,
        errors_count: u64,
        at: DateTime<Utc>,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE sync_logs
            SET records_processed = ?1, records_succeeded = ?2, errors_count = ?3,
                heartbeat_count = heartbeat_count + 1, last_heartbeat_at = ?4
            WHERE id = ?5 AND status = 'running'
            "#,
            params![
                records_processed as i64,
                records_succeeded as i64,
                errors_count as i64,
                at,
                run_id
            ],
        )?;
        Ok(affected > 0)
    }

    async fn finalize(&self, run_id: &str, completion: &RunCompletion) -> RepositoryResult<()> {
        if !completion.status.is_terminal() {
            return Err(RepositoryError::InvalidStateTransition {
                from: RunStatus::Running.to_string(),
                to: completion.status.to_string(),
            });
        }

        let samples_json = serde_json::to_string(&completion.error_samples)?;
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE sync_logs
            SET status = ?1, completed_at = ?2, records_processed = ?3, records_succeeded = ?4,
                errors_count = ?5, error_samples = ?6, failure_reason = ?7, failed_stage = ?8,
                processing_time_ms = ?9
            WHERE id = ?10 AND status = 'running'
            "#,
            params![
                completion.status.as_str(),
                completion.completed_at,
                completion.records_processed as i64,
                completion.records_succeeded as i64,
                completion.errors_count as i64,
                samples_json,
                completion.failure_reason,
                completion.failed_stage.map(|s| s.as_str()),
                completion.processing_time_ms,
                run_id,
            ],
        )?;

        if affected == 1 {
            return Ok(());
        }

        // 未命中：区分不存在与已是终态
        let current: Option<String> = conn
            .query_row(
                "SELECT status FROM sync_logs WHERE id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;

        match current {
            None => Err(RepositoryError::NotFound {
                entity: "ImportRun".to_string(),
                id: run_id.to_string(),
            }),
            Some(status) => Err(RepositoryError::InvalidStateTransition {
                from: status,
                to: completion.status.to_string(),
            }),
        }
    }

    async fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM sync_logs WHERE id = ?1", SELECT_COLUMNS);
        let run = conn
            .query_row(&sql, params![run_id], Self::map_row)
            .optional()?;
        Ok(run)
    }

    async fn list(&self, filter: &SyncLogFilter) -> RepositoryResult<Vec<ImportRun>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(kind) = filter.import_kind {
            conditions.push("import_kind = ?");
            values.push(Box::new(kind.as_str()));
        }
        if let Some(status) = filter.status {
            conditions.push("status = ?");
            values.push(Box::new(status.as_str()));
        }
        if let Some(after) = filter.started_after {
            conditions.push("started_at >= ?");
            values.push(Box::new(after));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM sync_logs {} ORDER BY started_at DESC, id LIMIT {}",
            SELECT_COLUMNS,
            where_clause,
            filter.effective_limit()
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), Self::map_row)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?);
        }
        Ok(runs)
    }

    async fn count_by_status(&self, status: RunStatus) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sync_logs WHERE status = ?1",
            params![status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}
