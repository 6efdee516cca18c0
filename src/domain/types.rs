// ==========================================
// 资产主数据导入 - 领域类型定义
// ==========================================
// 职责: 导入类型 / 运行状态 / 错误分类 / 阶段 等枚举
// 序列化格式: snake_case (与 sync_logs 表一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 导入类型 (Import Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Regions,   // 区域 + 分支
    Locations, // 位置
    Assets,    // 资产
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Regions => "regions",
            ImportKind::Locations => "locations",
            ImportKind::Assets => "assets",
        }
    }

    /// 用于成功消息中的实体名词
    pub fn noun(&self) -> &'static str {
        self.as_str()
    }

    /// 单条记录的名称（行级错误消息使用）
    pub fn record_label(&self) -> &'static str {
        match self {
            ImportKind::Regions => "region",
            ImportKind::Locations => "location",
            ImportKind::Assets => "asset",
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regions" | "region" => Ok(ImportKind::Regions),
            "locations" | "location" => Ok(ImportKind::Locations),
            "assets" | "asset" => Ok(ImportKind::Assets),
            other => Err(format!("未知的导入类型: {}", other)),
        }
    }
}

// ==========================================
// 运行状态 (Run Status)
// ==========================================
// 状态机: running → completed | completed_with_errors | failed
// 终态不可再变更
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::CompletedWithErrors => "completed_with_errors",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }

    /// 根据行级错误数推导正常结束时的终态
    pub fn from_error_count(errors_count: usize) -> Self {
        if errors_count > 0 {
            RunStatus::CompletedWithErrors
        } else {
            RunStatus::Completed
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "completed_with_errors" => Ok(RunStatus::CompletedWithErrors),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("未知的运行状态: {}", other)),
        }
    }
}

// ==========================================
// 行级错误分类 (Error Category)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    RequiredField,     // 必填字段缺失
    InvalidCharacters, // 字符集 / 格式不合法
    TooLong,           // 超长
    Parsing,           // 列数不匹配等解析问题
    LocationLookup,    // 引用解析失败
    StoreWrite,        // 单行写库失败
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::RequiredField => "required_field",
            ErrorCategory::InvalidCharacters => "invalid_characters",
            ErrorCategory::TooLong => "too_long",
            ErrorCategory::Parsing => "parsing",
            ErrorCategory::LocationLookup => "location_lookup",
            ErrorCategory::StoreWrite => "store_write",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 引擎阶段 (Run Stage)
// ==========================================
// received → authorized → downloaded → parsed → validated → indexed → ingesting → finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Received,
    Authorized,
    Downloaded,
    Parsed,
    Validated,
    Indexed,
    Ingesting,
    Finalized,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStage::Received => "received",
            RunStage::Authorized => "authorized",
            RunStage::Downloaded => "downloaded",
            RunStage::Parsed => "parsed",
            RunStage::Validated => "validated",
            RunStage::Indexed => "indexed",
            RunStage::Ingesting => "ingesting",
            RunStage::Finalized => "finalized",
        }
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "received" => Ok(RunStage::Received),
            "authorized" => Ok(RunStage::Authorized),
            "downloaded" => Ok(RunStage::Downloaded),
            "parsed" => Ok(RunStage::Parsed),
            "validated" => Ok(RunStage::Validated),
            "indexed" => Ok(RunStage::Indexed),
            "ingesting" => Ok(RunStage::Ingesting),
            "finalized" => Ok(RunStage::Finalized),
            other => Err(format!("未知的阶段: {}", other)),
        }
    }
}

// ==========================================
// 引用实体类型 (Reference Entity)
// ==========================================
// 引用索引按实体类型构建，每次运行每种类型只读取一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Country,  // 按国家代码索引
    Region,
    Branch,
    Location,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Country => "country",
            EntityType::Region => "region",
            EntityType::Branch => "branch",
            EntityType::Location => "location",
        }
    }

    /// 引用未命中时错误消息中的实体名
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityType::Country => "Country",
            EntityType::Region => "Region",
            EntityType::Branch => "Branch",
            EntityType::Location => "Location",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 写库结果 (Upsert Outcome)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}
