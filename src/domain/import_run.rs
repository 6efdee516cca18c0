// ==========================================
// 资产主数据导入 - 导入运行（同步日志）领域模型
// ==========================================
// 职责: ImportRun 生命周期记录 / 终态参数 / 导入汇总
// 红线: ImportRun 只能经由 ImportRunTracker 写入，永不删除
// ==========================================

use crate::domain::record::ImportError;
use crate::domain::types::{ErrorCategory, ImportKind, RunStage, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportRun - 同步日志
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRun {
    pub id: String,
    pub import_kind: ImportKind,
    pub status: RunStatus,
    pub file_name: String,
    pub initiated_by: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,

    // ===== 进度 =====
    pub records_processed: u64,
    pub records_succeeded: u64,
    pub errors_count: u64,
    pub heartbeat_count: u64,
    pub last_heartbeat_at: Option<DateTime<Utc>>,

    // ===== 终态详情 =====
    /// 前 N 条行级错误
    pub error_samples: Vec<ImportError>,
    pub failure_reason: Option<String>,
    pub failed_stage: Option<RunStage>,
    pub processing_time_ms: Option<i64>,
}

impl ImportRun {
    /// 新建 running 状态的运行记录
    pub fn start(
        import_kind: ImportKind,
        file_name: impl Into<String>,
        initiated_by: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            import_kind,
            status: RunStatus::Running,
            file_name: file_name.into(),
            initiated_by: initiated_by.into(),
            started_at: Utc::now(),
            completed_at: None,
            records_processed: 0,
            records_succeeded: 0,
            errors_count: 0,
            heartbeat_count: 0,
            last_heartbeat_at: None,
            error_samples: Vec::new(),
            failure_reason: None,
            failed_stage: None,
            processing_time_ms: None,
        }
    }
}

// ==========================================
// RunCompletion - 终态写入参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RunCompletion {
    pub status: RunStatus,
    pub records_processed: u64,
    pub records_succeeded: u64,
    pub errors_count: u64,
    pub error_samples: Vec<ImportError>,
    pub failure_reason: Option<String>,
    pub failed_stage: Option<RunStage>,
    pub processing_time_ms: i64,
    pub completed_at: DateTime<Utc>,
}

impl RunCompletion {
    /// 正常结束（completed / completed_with_errors）
    pub fn finished(
        records_processed: u64,
        records_succeeded: u64,
        errors: &[ImportError],
        processing_time_ms: i64,
    ) -> Self {
        Self {
            status: RunStatus::from_error_count(errors.len()),
            records_processed,
            records_succeeded,
            errors_count: errors.len() as u64,
            error_samples: errors.to_vec(),
            failure_reason: None,
            failed_stage: None,
            processing_time_ms,
            completed_at: Utc::now(),
        }
    }

    /// 致命失败
    pub fn failed(stage: RunStage, reason: impl Into<String>, processing_time_ms: i64) -> Self {
        Self {
            status: RunStatus::Failed,
            records_processed: 0,
            records_succeeded: 0,
            errors_count: 0,
            error_samples: Vec::new(),
            failure_reason: Some(reason.into()),
            failed_stage: Some(stage),
            processing_time_ms,
            completed_at: Utc::now(),
        }
    }
}

// ==========================================
// 同步日志查询条件
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogFilter {
    pub import_kind: Option<ImportKind>,
    pub status: Option<RunStatus>,
    pub started_after: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl SyncLogFilter {
    pub const DEFAULT_LIMIT: usize = 20;
    pub const MAX_LIMIT: usize = 100;

    /// 生效的条数上限（默认 20，最大 100）
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }
}

// ==========================================
// 错误分类统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBreakdown {
    /// invalid_characters + too_long
    pub validation_errors: usize,
    pub lookup_errors: usize,
    pub parsing_errors: usize,
    pub required_field_errors: usize,
    pub store_errors: usize,
}

impl ErrorBreakdown {
    pub fn from_errors(errors: &[ImportError]) -> Self {
        let mut breakdown = Self::default();
        for error in errors {
            match error.category {
                ErrorCategory::InvalidCharacters | ErrorCategory::TooLong => {
                    breakdown.validation_errors += 1
                }
                ErrorCategory::LocationLookup => breakdown.lookup_errors += 1,
                ErrorCategory::Parsing => breakdown.parsing_errors += 1,
                ErrorCategory::RequiredField => breakdown.required_field_errors += 1,
                ErrorCategory::StoreWrite => breakdown.store_errors += 1,
            }
        }
        breakdown
    }

    pub fn total(&self) -> usize {
        self.validation_errors
            + self.lookup_errors
            + self.parsing_errors
            + self.required_field_errors
            + self.store_errors
    }
}

/// 各分类的错误消息样本（每类前 N 条）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySamples {
    pub sample_validation_errors: Vec<String>,
    pub sample_lookup_errors: Vec<String>,
    pub sample_parsing_errors: Vec<String>,
    pub sample_required_field_errors: Vec<String>,
    pub sample_store_errors: Vec<String>,
}

impl CategorySamples {
    pub fn from_errors(errors: &[ImportError], per_category: usize) -> Self {
        let mut samples = Self::default();
        for error in errors {
            let bucket = match error.category {
                ErrorCategory::InvalidCharacters | ErrorCategory::TooLong => {
                    &mut samples.sample_validation_errors
                }
                ErrorCategory::LocationLookup => &mut samples.sample_lookup_errors,
                ErrorCategory::Parsing => &mut samples.sample_parsing_errors,
                ErrorCategory::RequiredField => &mut samples.sample_required_field_errors,
                ErrorCategory::StoreWrite => &mut samples.sample_store_errors,
            };
            if bucket.len() < per_category {
                bucket.push(error.message.clone());
            }
        }
        samples
    }
}

// ==========================================
// ImportSummary - 引擎返回的导入汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub run_id: String,
    pub import_kind: ImportKind,
    pub status: RunStatus,
    /// 数据行数（不含表头与空行）
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// 通过字段校验的行数
    pub valid_records: usize,
    pub created_count: usize,
    pub updated_count: usize,
    pub unchanged_count: usize,
    pub error_breakdown: ErrorBreakdown,
    /// 前 N 条行级错误
    pub errors: Vec<ImportError>,
    pub samples: CategorySamples,
    pub elapsed_ms: i64,
}

/// 数据统计（导入页概览）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStats {
    pub total_assets: u64,
    pub total_locations: u64,
    pub successful_imports: u64,
}
