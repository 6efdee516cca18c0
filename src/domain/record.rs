// ==========================================
// 资产主数据导入 - 记录领域模型
// ==========================================
// 职责: 原始行 / 校验后记录 / 解析引用后记录 / 行级错误
// 红线: RawRecord 只在内存中存在，不落库
// ==========================================

use crate::domain::types::{ErrorCategory, ImportKind};
use serde::{Deserialize, Serialize};

// ==========================================
// 调用方身份与导入请求
// ==========================================

/// 已认证的调用方（认证本身由外部完成）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    /// admin / manager 角色
    pub is_privileged: bool,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, is_privileged: bool) -> Self {
        Self {
            user_id: user_id.into(),
            is_privileged,
        }
    }
}

/// 导入请求（创建后不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub import_kind: ImportKind,
    pub source_file_name: String,
    /// None 表示未认证
    pub requested_by: Option<Caller>,
}

impl ImportRequest {
    pub fn new(
        import_kind: ImportKind,
        source_file_name: impl Into<String>,
        requested_by: Option<Caller>,
    ) -> Self {
        Self {
            import_kind,
            source_file_name: source_file_name.into(),
            requested_by,
        }
    }
}

// ==========================================
// RawRecord - 表头 → 原始值 的有序映射
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 文件行号（表头为第 1 行）
    pub row_number: usize,
    fields: Vec<(String, String)>,
}

impl RawRecord {
    /// 按表头顺序组装原始行
    ///
    /// # 参数
    /// - row_number: 文件行号
    /// - headers: 规范化后的表头
    /// - values: 已清洗的字段值（调用方保证与表头等长）
    pub fn from_columns(row_number: usize, headers: &[String], values: Vec<String>) -> Self {
        let fields = headers.iter().cloned().zip(values).collect();
        Self { row_number, fields }
    }

    /// 读取字段值；列不存在时返回 None
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// 读取非空字段值
    pub fn get_non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|v| !v.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ==========================================
// 校验后记录 (ValidatedRecord)
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionInput {
    pub region_name: String,
    /// 已转大写
    pub country_code: String,
    pub branch_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInput {
    pub name: String,
    pub erp_location_id: Option<String>,
    pub branch_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetInput {
    pub name: String,
    pub erp_asset_id: String,
    pub location_name: Option<String>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub model: Option<String>,
    pub build: Option<String>,
    /// 缺省为 active
    pub status: String,
}

/// 通过全部字段约束的记录，写库前必然处于此形态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatedRecord {
    Region(RegionInput),
    Location(LocationInput),
    Asset(AssetInput),
}

impl ValidatedRecord {
    pub fn kind(&self) -> ImportKind {
        match self {
            ValidatedRecord::Region(_) => ImportKind::Regions,
            ValidatedRecord::Location(_) => ImportKind::Locations,
            ValidatedRecord::Asset(_) => ImportKind::Assets,
        }
    }
}

// ==========================================
// 解析引用后的记录（可直接写库）
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegion {
    pub region_name: String,
    pub country_id: i64,
    pub branch_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    pub name: String,
    pub erp_location_id: Option<String>,
    pub branch_id: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub name: String,
    pub erp_asset_id: String,
    pub location_id: Option<i64>,
    pub barcode: Option<String>,
    pub category: Option<String>,
    pub model: Option<String>,
    pub build: Option<String>,
    pub status: String,
}

// ==========================================
// ImportError - 行级错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportError {
    pub row_number: usize,
    pub message: String,
    pub category: ErrorCategory,
}

impl ImportError {
    /// 构造行级错误，消息统一带 "Row N:" 前缀
    pub fn new(row_number: usize, category: ErrorCategory, detail: impl AsRef<str>) -> Self {
        Self {
            row_number,
            message: format!("Row {}: {}", row_number, detail.as_ref()),
            category,
        }
    }

    pub fn required(row_number: usize, field: &str) -> Self {
        Self::new(
            row_number,
            ErrorCategory::RequiredField,
            format!("{} is required", field),
        )
    }

    pub fn too_long(row_number: usize, field: &str, max: usize) -> Self {
        Self::new(
            row_number,
            ErrorCategory::TooLong,
            format!("{} is too long (max {} characters)", field, max),
        )
    }

    pub fn invalid_characters(row_number: usize, field: &str, value: &str) -> Self {
        Self::new(
            row_number,
            ErrorCategory::InvalidCharacters,
            format!("{} \"{}\" contains invalid characters", field, value),
        )
    }
}
