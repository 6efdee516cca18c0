// ==========================================
// 资产主数据导入 - 导入 API
// ==========================================
// 职责: 请求 / 响应契约、导入历史查询、数据统计、错误报告导出
// 响应: 成功 { success: true, message, details }
//       失败 { success: false, error }（不含内部细节）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::audit::AuditSink;
use crate::config::{ConfigManager, ImportConfigReader, ImportSettings};
use crate::db::open_and_bootstrap;
use crate::domain::import_run::{
    CategorySamples, DataStats, ErrorBreakdown, ImportRun, ImportSummary, SyncLogFilter,
};
use crate::domain::record::{Caller, ImportError, ImportRequest};
use crate::domain::types::{ImportKind, RunStatus};
use crate::importer::IngestionEngine;
use crate::repository::{
    ReferenceStore, RepositoryError, SqliteReferenceStore, SqliteSyncLogRepository,
    SyncLogRepository,
};
use crate::storage::BlobStore;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::info;

// ==========================================
// 响应结构
// ==========================================

/// 导入成功时的明细
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDetails {
    pub run_id: String,
    pub status: RunStatus,
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub valid_records: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub unchanged_count: usize,
    pub error_breakdown: ErrorBreakdown,
    /// 前 N 条行级错误
    pub errors: Vec<ImportError>,
    #[serde(flatten)]
    pub samples: CategorySamples,
    pub processing_time_ms: i64,
}

impl From<ImportSummary> for ImportDetails {
    fn from(summary: ImportSummary) -> Self {
        Self {
            run_id: summary.run_id,
            status: summary.status,
            total_rows: summary.total_rows,
            success_count: summary.success_count,
            error_count: summary.error_count,
            valid_records: summary.valid_records,
            created_count: summary.created_count,
            updated_count: summary.updated_count,
            unchanged_count: summary.unchanged_count,
            error_breakdown: summary.error_breakdown,
            errors: summary.errors,
            samples: summary.samples,
            processing_time_ms: summary.elapsed_ms,
        }
    }
}

/// 响应体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponseBody {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ImportDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// 导入响应（状态码 + 响应体）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub status_code: u16,
    pub body: ImportResponseBody,
}

impl ImportResponse {
    /// 部分成功同样返回 success = true
    pub fn from_summary(summary: ImportSummary) -> Self {
        let message = format!(
            "Import completed: {} {} imported successfully from {} total rows",
            summary.success_count,
            summary.import_kind.noun(),
            summary.total_rows
        );
        Self {
            status_code: 200,
            body: ImportResponseBody {
                success: true,
                message: Some(message),
                details: Some(summary.into()),
                error: None,
            },
        }
    }

    pub fn from_error(err: &ApiError) -> Self {
        Self {
            status_code: err.status_code(),
            body: ImportResponseBody {
                success: false,
                message: None,
                details: None,
                error: Some(err.public_message()),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.body.success
    }
}

/// 错误报告中的一行
#[derive(Debug, Serialize)]
struct ErrorReportRow<'a> {
    row: usize,
    category: &'a str,
    message: &'a str,
}

// ==========================================
// ImportApi
// ==========================================
pub struct ImportApi {
    engine: IngestionEngine,
    store: Arc<dyn ReferenceStore>,
    sync_logs: Arc<dyn SyncLogRepository>,
}

impl ImportApi {
    /// 打开数据库并装配导入 API（参数从 config_kv 读取）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - blobs: 上传文件存储
    pub async fn open(db_path: &str, blobs: Arc<dyn BlobStore>) -> ApiResult<Self> {
        let conn = open_and_bootstrap(db_path).map_err(RepositoryError::from)?;
        let conn = Arc::new(Mutex::new(conn));

        let config = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::InternalError(format!("配置加载失败: {}", e)))?;
        let settings = config
            .load_import_settings()
            .await
            .map_err(|e| ApiError::InternalError(format!("导入参数读取失败: {}", e)))?;

        info!(db_path, batch_size = settings.batch_size, "导入 API 已初始化");

        Ok(Self::from_parts(
            Arc::new(SqliteReferenceStore::from_connection(conn.clone())),
            Arc::new(SqliteSyncLogRepository::from_connection(conn)),
            blobs,
            settings,
        ))
    }

    /// 由已有组件装配
    pub fn from_parts(
        store: Arc<dyn ReferenceStore>,
        sync_logs: Arc<dyn SyncLogRepository>,
        blobs: Arc<dyn BlobStore>,
        settings: ImportSettings,
    ) -> Self {
        let engine = IngestionEngine::new(store.clone(), blobs, sync_logs.clone(), settings);
        Self {
            engine,
            store,
            sync_logs,
        }
    }

    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.engine = self.engine.with_audit_sink(sink);
        self
    }

    pub fn engine(&self) -> &IngestionEngine {
        &self.engine
    }

    /// 导入一个已上传的 CSV 文件
    ///
    /// # 参数
    /// - caller: 已认证身份（None 表示未认证）
    /// - kind: 导入类型
    /// - file_name: 上传文件名
    ///
    /// # 返回
    /// 总是返回响应；失败时状态码非 2xx，error 为对外安全消息
    pub async fn import_file(
        &self,
        caller: Option<Caller>,
        kind: ImportKind,
        file_name: &str,
    ) -> ImportResponse {
        match self.engine.run(ImportRequest::new(kind, file_name, caller)).await {
            Ok(summary) => ImportResponse::from_summary(summary),
            Err(err) => ImportResponse::from_error(&ApiError::from(err)),
        }
    }

    // ==========================================
    // 导入历史
    // ==========================================

    /// 按条件查询运行记录（最新在前）
    pub async fn list_runs(&self, filter: &SyncLogFilter) -> ApiResult<Vec<ImportRun>> {
        Ok(self.sync_logs.list(filter).await?)
    }

    pub async fn get_run(&self, run_id: &str) -> ApiResult<ImportRun> {
        self.sync_logs
            .find_by_id(run_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Import run {} not found", run_id)))
    }

    /// 数据统计
    pub async fn data_stats(&self) -> ApiResult<DataStats> {
        let counts = self.store.count_reference_data().await?;
        let successful_imports = self.sync_logs.count_by_status(RunStatus::Completed).await?;
        Ok(DataStats {
            total_assets: counts.assets,
            total_locations: counts.locations,
            successful_imports,
        })
    }

    /// 导出某次运行的错误样本（CSV: row,category,message）
    ///
    /// # 返回
    /// - Ok(usize): 写出的错误行数
    pub async fn export_error_report<W: Write>(&self, run_id: &str, writer: W) -> ApiResult<usize> {
        let run = self.get_run(run_id).await?;
        write_error_report(&run.error_samples, writer)
    }
}

/// 将行级错误写为 CSV 报告
pub fn write_error_report<W: Write>(errors: &[ImportError], writer: W) -> ApiResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for error in errors {
        csv_writer
            .serialize(ErrorReportRow {
                row: error.row_number,
                category: error.category.as_str(),
                message: &error.message,
            })
            .map_err(|e| ApiError::InternalError(format!("错误报告写入失败: {}", e)))?;
    }
    csv_writer
        .flush()
        .map_err(|e| ApiError::InternalError(format!("错误报告写入失败: {}", e)))?;
    Ok(errors.len())
}
