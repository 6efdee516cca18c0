// ==========================================
// 资产主数据导入 - 安全审计
// ==========================================
// 职责: 安全/审计事件定义 + 可注入的事件接收器
// 说明: 引擎持有 Option<Arc<dyn AuditSink>>，未注入时不产生审计事件
// ==========================================

use crate::domain::types::ImportKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Mutex;

// ==========================================
// AuditAction - 审计事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    UnauthorizedAccessAttempt, // 未认证调用
    UnauthorizedRoleAccess,    // 非 admin/manager 调用
    SuspiciousFilename,        // 文件名不在白名单内
    OversizedFileAttempt,      // 文件/文本/行数超限
    CsvProcessingStarted,
    CsvProcessingCompleted,
    CsvProcessingError,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::UnauthorizedAccessAttempt => "unauthorized_access_attempt",
            AuditAction::UnauthorizedRoleAccess => "unauthorized_role_access",
            AuditAction::SuspiciousFilename => "suspicious_filename",
            AuditAction::OversizedFileAttempt => "oversized_file_attempt",
            AuditAction::CsvProcessingStarted => "csv_processing_started",
            AuditAction::CsvProcessingCompleted => "csv_processing_completed",
            AuditAction::CsvProcessingError => "csv_processing_error",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// AuditEvent - 审计事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub action: AuditAction,
    pub user_id: Option<String>,
    pub import_kind: ImportKind,
    pub file_name: Option<String>,
    /// 事件附加信息（计数、耗时、原因等）
    pub details: JsonValue,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, import_kind: ImportKind) -> Self {
        Self {
            action,
            user_id: None,
            import_kind,
            file_name: None,
            details: JsonValue::Null,
            occurred_at: Utc::now(),
        }
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn file(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn details(mut self, details: JsonValue) -> Self {
        self.details = details;
        self
    }
}

// ==========================================
// AuditSink Trait
// ==========================================
// 实现者: TracingAuditSink, MemoryAuditSink
// 约束: 记录失败不得影响导入流程，因此不返回 Result
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// 以 tracing 事件输出审计日志（target = "audit"）
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        let details = event.details.to_string();
        match event.action {
            AuditAction::UnauthorizedAccessAttempt
            | AuditAction::UnauthorizedRoleAccess
            | AuditAction::SuspiciousFilename
            | AuditAction::OversizedFileAttempt
            | AuditAction::CsvProcessingError => {
                tracing::warn!(
                    target: "audit",
                    action = %event.action,
                    kind = %event.import_kind,
                    user_id = event.user_id.as_deref().unwrap_or("-"),
                    file_name = event.file_name.as_deref().unwrap_or("-"),
                    details = %details,
                    "安全审计事件"
                );
            }
            AuditAction::CsvProcessingStarted | AuditAction::CsvProcessingCompleted => {
                tracing::info!(
                    target: "audit",
                    action = %event.action,
                    kind = %event.import_kind,
                    user_id = event.user_id.as_deref().unwrap_or("-"),
                    file_name = event.file_name.as_deref().unwrap_or("-"),
                    details = %details,
                    "审计事件"
                );
            }
        }
    }
}

/// 内存审计接收器（测试 / 调用方自行消费事件）
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录事件的快照
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        self.events().into_iter().map(|e| e.action).collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
