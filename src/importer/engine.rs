// ==========================================
// 资产主数据导入 - 通用导入引擎
// ==========================================
// 阶段:
// received → authorized → downloaded → parsed → validated → indexed → ingesting → finalized
// 任一阶段的致命错误 → failed（不写任何行）；行级错误只计数，不中断运行
// 约束:
// - 行严格按文件顺序处理，单行单次 upsert（按自然键，重跑幂等）
// - 每 N 个批次及最后一个批次写心跳
// - 运行记录在每条退出路径上恰好结束一次（含 panic）
// ==========================================

use crate::audit::{AuditAction, AuditEvent, AuditSink};
use crate::config::ImportSettings;
use crate::domain::import_run::{
    CategorySamples, ErrorBreakdown, ImportSummary, RunCompletion,
};
use crate::domain::record::{Caller, ImportError, ImportRequest, RawRecord};
use crate::domain::types::{ErrorCategory, ImportKind, RunStage, RunStatus, UpsertOutcome};
use crate::importer::error::{PipelineError, PipelineResult};
use crate::importer::field_mapper::{canonicalize_headers, missing_columns};
use crate::importer::resolver::ReferenceSet;
use crate::importer::strategy::{AssetStrategy, ImportStrategy, LocationStrategy, RegionStrategy};
use crate::importer::tokenizer::{parse_header, split_lines, tokenize_line, SourceLine};
use crate::importer::tracker::ImportRunTracker;
use crate::repository::error::RepositoryResult;
use crate::repository::reference_store::ReferenceStore;
use crate::repository::sync_log_repo::SyncLogRepository;
use crate::storage::BlobStore;
use futures::FutureExt;
use regex::Regex;
use serde_json::json;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// 上传文件名白名单
static FILE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-.]+$").expect("valid regex"));

const MAX_FILE_NAME_LEN: usize = 255;

// ==========================================
// 内部结果结构
// ==========================================

/// 切分后的文件：标准化表头 + 数据行
#[derive(Debug)]
pub struct ParsedFile<'a> {
    pub headers: Vec<String>,
    pub data_lines: Vec<SourceLine<'a>>,
}

/// 行处理结果
#[derive(Debug, Default)]
struct IngestOutcome {
    total_rows: usize,
    valid_records: usize,
    created: usize,
    updated: usize,
    unchanged: usize,
    errors: Vec<ImportError>,
}

impl IngestOutcome {
    fn succeeded(&self) -> usize {
        self.created + self.updated + self.unchanged
    }

    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created => self.created += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// 切分文本并执行结构级检查（行数上限 / 必需表头）
///
/// # 返回
/// - Err(EmptyFile): 没有数据行
/// - Err(TooManyRows): 数据行超过上限（在任何校验之前）
/// - Err(MissingHeaders): 缺少必需列
pub fn parse_file<'a>(
    kind: ImportKind,
    text: &'a str,
    required_headers: &[&str],
    max_rows: usize,
) -> PipelineResult<ParsedFile<'a>> {
    let mut lines = split_lines(text);
    if lines.is_empty() {
        return Err(PipelineError::EmptyFile);
    }

    let header_line = lines.remove(0);
    if lines.is_empty() {
        return Err(PipelineError::EmptyFile);
    }
    if lines.len() > max_rows {
        return Err(PipelineError::TooManyRows {
            rows: lines.len(),
            limit: max_rows,
        });
    }

    let headers = canonicalize_headers(kind, &parse_header(header_line.text));
    let missing = missing_columns(&headers, required_headers);
    if !missing.is_empty() {
        return Err(PipelineError::MissingHeaders(missing));
    }

    Ok(ParsedFile {
        headers,
        data_lines: lines,
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "未知 panic".to_string()
    }
}

fn enter(stage: &mut RunStage, next: RunStage) {
    debug!(from = %stage, to = %next, "阶段切换");
    *stage = next;
}

// ==========================================
// IngestionEngine
// ==========================================
pub struct IngestionEngine {
    store: Arc<dyn ReferenceStore>,
    blobs: Arc<dyn BlobStore>,
    tracker: ImportRunTracker,
    settings: ImportSettings,
    audit: Option<Arc<dyn AuditSink>>,
}

impl IngestionEngine {
    /// 创建引擎
    ///
    /// # 参数
    /// - store: 参考数据存储
    /// - blobs: 上传文件存储
    /// - sync_logs: 同步日志仓储（仅经由 tracker 写入）
    /// - settings: 导入参数
    pub fn new(
        store: Arc<dyn ReferenceStore>,
        blobs: Arc<dyn BlobStore>,
        sync_logs: Arc<dyn SyncLogRepository>,
        settings: ImportSettings,
    ) -> Self {
        let settings = settings.normalized();
        Self {
            store,
            blobs,
            tracker: ImportRunTracker::new(sync_logs, settings.persisted_error_cap),
            settings,
            audit: None,
        }
    }

    /// 注入审计接收器
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn tracker(&self) -> &ImportRunTracker {
        &self.tracker
    }

    async fn emit(&self, event: AuditEvent) {
        if let Some(sink) = &self.audit {
            sink.record(event).await;
        }
    }

    // ==========================================
    // 主流程
    // ==========================================

    /// 执行一次导入
    ///
    /// # 返回
    /// - Ok(ImportSummary): 运行完成（可能含行级错误）
    /// - Err(PipelineError): 致命错误；若运行记录已创建，则已写入 failed
    #[instrument(
        skip(self, request),
        fields(kind = %request.import_kind, file_name = %request.source_file_name)
    )]
    pub async fn run(&self, request: ImportRequest) -> PipelineResult<ImportSummary> {
        let started = Instant::now();
        let kind = request.import_kind;

        // ===== received → authorized =====
        let caller = self.authorize(&request).await?;
        let file_name = self.check_file_name(&request, &caller).await?;

        let run_id = match self.tracker.start(kind, &file_name, &caller.user_id).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "运行记录创建失败");
                let err = PipelineError::StoreUnavailable(e.to_string());
                self.emit(
                    AuditEvent::new(AuditAction::CsvProcessingError, kind)
                        .user(&caller.user_id)
                        .file(&file_name)
                        .details(json!({ "stage": RunStage::Authorized, "error": err.to_string() })),
                )
                .await;
                return Err(err);
            }
        };

        self.emit(
            AuditEvent::new(AuditAction::CsvProcessingStarted, kind)
                .user(&caller.user_id)
                .file(&file_name)
                .details(json!({ "runId": run_id })),
        )
        .await;

        let mut stage = RunStage::Authorized;
        let outcome = AssertUnwindSafe(self.process(kind, &run_id, &file_name, &mut stage))
            .catch_unwind()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as i64;

        match outcome {
            Ok(Ok(ingest)) => {
                Ok(self
                    .complete(kind, &run_id, &file_name, &caller, ingest, elapsed_ms)
                    .await)
            }
            Ok(Err(err)) => {
                Err(self
                    .fail(kind, &run_id, &file_name, &caller, stage, err, elapsed_ms)
                    .await)
            }
            Err(payload) => {
                let err = PipelineError::Internal(panic_message(payload.as_ref()));
                Err(self
                    .fail(kind, &run_id, &file_name, &caller, stage, err, elapsed_ms)
                    .await)
            }
        }
    }

    /// 下载 → 解码 → 按导入类型分派
    async fn process(
        &self,
        kind: ImportKind,
        run_id: &str,
        file_name: &str,
        stage: &mut RunStage,
    ) -> PipelineResult<IngestOutcome> {
        let bytes = self.download(file_name).await?;
        enter(stage, RunStage::Downloaded);

        let text = self.decode(bytes)?;

        match kind {
            ImportKind::Regions => self.ingest(&RegionStrategy, run_id, &text, stage).await,
            ImportKind::Locations => self.ingest(&LocationStrategy, run_id, &text, stage).await,
            ImportKind::Assets => self.ingest(&AssetStrategy, run_id, &text, stage).await,
        }
    }

    // ==========================================
    // 前置检查
    // ==========================================

    async fn authorize(&self, request: &ImportRequest) -> PipelineResult<Caller> {
        let kind = request.import_kind;
        match &request.requested_by {
            Some(caller) if !caller.user_id.trim().is_empty() => {
                if caller.is_privileged {
                    return Ok(caller.clone());
                }
                warn!(user_id = %caller.user_id, "非特权用户尝试导入");
                self.emit(
                    AuditEvent::new(AuditAction::UnauthorizedRoleAccess, kind)
                        .user(&caller.user_id)
                        .file(&request.source_file_name),
                )
                .await;
                Err(PipelineError::Forbidden(caller.user_id.clone()))
            }
            _ => {
                warn!("未认证的导入请求");
                self.emit(
                    AuditEvent::new(AuditAction::UnauthorizedAccessAttempt, kind)
                        .file(&request.source_file_name),
                )
                .await;
                Err(PipelineError::Unauthenticated)
            }
        }
    }

    async fn check_file_name(
        &self,
        request: &ImportRequest,
        caller: &Caller,
    ) -> PipelineResult<String> {
        let name = request.source_file_name.trim();
        if name.is_empty() {
            return Err(PipelineError::MissingFileName);
        }

        // 白名单只约束最后一段；目录部分不得为绝对路径、空段或含反斜杠
        let base_name = name.rsplit('/').next().unwrap_or(name);
        if name.len() > MAX_FILE_NAME_LEN
            || name.contains("..")
            || name.starts_with('/')
            || name.contains("//")
            || name.contains('\\')
            || !FILE_NAME_RE.is_match(base_name)
        {
            warn!(user_id = %caller.user_id, file_name = name, "可疑文件名");
            self.emit(
                AuditEvent::new(AuditAction::SuspiciousFilename, request.import_kind)
                    .user(&caller.user_id)
                    .file(name),
            )
            .await;
            return Err(PipelineError::InvalidFileName(name.to_string()));
        }

        Ok(name.to_string())
    }

    async fn download(&self, file_name: &str) -> PipelineResult<Vec<u8>> {
        let timeout = self.settings.download_timeout;
        match tokio::time::timeout(timeout, self.blobs.download(file_name)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PipelineError::DownloadTimeout {
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// 文件大小 → UTF-8 解码 → 文本大小
    fn decode(&self, bytes: Vec<u8>) -> PipelineResult<String> {
        let size = bytes.len() as u64;
        if size > self.settings.max_file_bytes {
            return Err(PipelineError::FileTooLarge {
                size,
                limit: self.settings.max_file_bytes,
            });
        }

        let text = String::from_utf8(bytes).map_err(|e| PipelineError::InvalidEncoding(e.to_string()))?;
        let text_size = text.len() as u64;
        if text_size > self.settings.max_text_bytes {
            return Err(PipelineError::TextTooLarge {
                size: text_size,
                limit: self.settings.max_text_bytes,
            });
        }
        Ok(text)
    }

    // ==========================================
    // 行处理
    // ==========================================

    async fn ingest<S: ImportStrategy>(
        &self,
        strategy: &S,
        run_id: &str,
        text: &str,
        stage: &mut RunStage,
    ) -> PipelineResult<IngestOutcome> {
        let kind = strategy.kind();

        // ===== parsed =====
        let parsed = parse_file(kind, text, strategy.required_headers(), self.settings.max_rows)?;
        enter(stage, RunStage::Parsed);

        let mut outcome = IngestOutcome {
            total_rows: parsed.data_lines.len(),
            ..Default::default()
        };

        // ===== validated =====
        let mut valid: Vec<(usize, S::Input)> = Vec::with_capacity(outcome.total_rows);
        for line in &parsed.data_lines {
            let values = tokenize_line(line.text);
            if values.len() != parsed.headers.len() {
                outcome.errors.push(ImportError::new(
                    line.row_number,
                    ErrorCategory::Parsing,
                    format!(
                        "column mismatch: expected {} columns, got {}",
                        parsed.headers.len(),
                        values.len()
                    ),
                ));
                continue;
            }

            let record = RawRecord::from_columns(line.row_number, &parsed.headers, values);
            match strategy.validate(&record) {
                Ok(input) => valid.push((line.row_number, input)),
                Err(e) => outcome.errors.push(e),
            }
        }
        outcome.valid_records = valid.len();
        enter(stage, RunStage::Validated);
        info!(
            run_id,
            total_rows = outcome.total_rows,
            valid = outcome.valid_records,
            rejected = outcome.errors.len(),
            "校验完成"
        );

        // ===== indexed =====
        let refs = ReferenceSet::build(self.store.as_ref(), strategy.reference_entities())
            .await
            .map_err(|e| PipelineError::StoreUnavailable(e.to_string()))?;
        enter(stage, RunStage::Indexed);

        // ===== ingesting =====
        enter(stage, RunStage::Ingesting);
        let batch_size = self.settings.batch_size;
        let total_batches = valid.len().div_ceil(batch_size);
        let mut processed = outcome.errors.len();
        let mut pending = valid.into_iter().peekable();
        let mut batch_number = 0usize;

        while pending.peek().is_some() {
            batch_number += 1;

            for (row_number, input) in pending.by_ref().take(batch_size) {
                processed += 1;
                let key = strategy.natural_key(&input);

                let resolved = match strategy.resolve(input, &refs, row_number) {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        debug!(run_id, row_number, error = %e.message, "引用解析失败");
                        outcome.errors.push(e);
                        continue;
                    }
                };

                match self.write_with_retry(strategy, &resolved).await {
                    Ok(result) => outcome.record(result),
                    Err(e) => {
                        warn!(run_id, row_number, key = %key, error = %e, "单行写库失败");
                        outcome.errors.push(ImportError::new(
                            row_number,
                            ErrorCategory::StoreWrite,
                            format!(
                                "failed to write {} \"{}\": {}",
                                kind.record_label(),
                                key,
                                e.row_reason()
                            ),
                        ));
                    }
                }
            }

            if batch_number % self.settings.heartbeat_every_batches == 0
                || batch_number == total_batches
            {
                self.tracker
                    .heartbeat(
                        run_id,
                        processed as u64,
                        outcome.succeeded() as u64,
                        outcome.errors.len() as u64,
                    )
                    .await;
            }
        }

        outcome.errors.sort_by_key(|e| e.row_number);
        Ok(outcome)
    }

    /// 单行写库；仅对瞬时错误做有限次重试
    async fn write_with_retry<S: ImportStrategy>(
        &self,
        strategy: &S,
        record: &S::Resolved,
    ) -> RepositoryResult<UpsertOutcome> {
        let mut attempt: u32 = 0;
        loop {
            match strategy.upsert(self.store.as_ref(), record).await {
                Err(e) if e.is_transient() && attempt < self.settings.row_write_retries => {
                    attempt += 1;
                    debug!(attempt, error = %e, "瞬时写库错误，重试");
                    tokio::time::sleep(self.settings.retry_backoff * attempt).await;
                }
                result => return result,
            }
        }
    }

    // ==========================================
    // 结束
    // ==========================================

    async fn complete(
        &self,
        kind: ImportKind,
        run_id: &str,
        file_name: &str,
        caller: &Caller,
        outcome: IngestOutcome,
        elapsed_ms: i64,
    ) -> ImportSummary {
        let succeeded = outcome.succeeded();
        let completion = RunCompletion::finished(
            outcome.total_rows as u64,
            succeeded as u64,
            &outcome.errors,
            elapsed_ms,
        );
        let status = completion.status;

        if let Err(e) = self.tracker.finish(run_id, completion).await {
            error!(run_id, error = %e, "运行记录结束写入失败");
        }

        // 源文件清理为尽力而为
        if let Err(e) = self.blobs.delete(file_name).await {
            warn!(run_id, file_name, error = %e, "源文件删除失败");
        }

        self.emit(
            AuditEvent::new(AuditAction::CsvProcessingCompleted, kind)
                .user(&caller.user_id)
                .file(file_name)
                .details(json!({
                    "runId": run_id,
                    "successCount": succeeded,
                    "errorCount": outcome.errors.len(),
                    "processingTimeMs": elapsed_ms,
                })),
        )
        .await;

        info!(
            run_id,
            status = %status,
            total_rows = outcome.total_rows,
            succeeded,
            created = outcome.created,
            updated = outcome.updated,
            unchanged = outcome.unchanged,
            errors = outcome.errors.len(),
            elapsed_ms,
            "导入完成"
        );

        self.summarize(kind, run_id, status, outcome, elapsed_ms)
    }

    #[allow(clippy::too_many_arguments)]
    async fn fail(
        &self,
        kind: ImportKind,
        run_id: &str,
        file_name: &str,
        caller: &Caller,
        stage: RunStage,
        err: PipelineError,
        elapsed_ms: i64,
    ) -> PipelineError {
        error!(run_id, stage = %stage, error = %err, "导入失败");

        let completion = RunCompletion::failed(stage, err.to_string(), elapsed_ms);
        if let Err(e) = self.tracker.finish(run_id, completion).await {
            error!(run_id, error = %e, "运行记录结束写入失败");
        }

        if err.is_oversize() {
            self.emit(
                AuditEvent::new(AuditAction::OversizedFileAttempt, kind)
                    .user(&caller.user_id)
                    .file(file_name)
                    .details(json!({ "runId": run_id, "error": err.to_string() })),
            )
            .await;
        }
        self.emit(
            AuditEvent::new(AuditAction::CsvProcessingError, kind)
                .user(&caller.user_id)
                .file(file_name)
                .details(json!({
                    "runId": run_id,
                    "stage": stage,
                    "error": err.to_string(),
                    "processingTimeMs": elapsed_ms,
                })),
        )
        .await;

        err
    }

    fn summarize(
        &self,
        kind: ImportKind,
        run_id: &str,
        status: RunStatus,
        outcome: IngestOutcome,
        elapsed_ms: i64,
    ) -> ImportSummary {
        let error_breakdown = ErrorBreakdown::from_errors(&outcome.errors);
        let samples = CategorySamples::from_errors(&outcome.errors, self.settings.category_sample_cap);
        let success_count = outcome.succeeded();
        let error_count = outcome.errors.len();

        let mut errors = outcome.errors;
        errors.truncate(self.settings.response_error_cap);

        ImportSummary {
            run_id: run_id.to_string(),
            import_kind: kind,
            status,
            total_rows: outcome.total_rows,
            success_count,
            error_count,
            valid_records: outcome.valid_records,
            created_count: outcome.created,
            updated_count: outcome.updated,
            unchanged_count: outcome.unchanged,
            error_breakdown,
            errors,
            samples,
            elapsed_ms,
        }
    }
}
