// ==========================================
// 资产主数据导入 - 记录校验器
// ==========================================
// 职责: RawRecord → ValidatedRecord（按导入类型的规则表）
// 规则:
// - 第一轮检查全部必填字段，第二轮按表顺序检查长度与字符集
// - 单行内遇到第一个失败即返回（fail-fast），跨行继续
// - 纯函数，不做任何 I/O
// ==========================================

use crate::domain::record::{
    AssetInput, ImportError, LocationInput, RawRecord, RegionInput, ValidatedRecord,
};
use crate::domain::types::{ErrorCategory, ImportKind};
use crate::importer::field_mapper::columns::*;
use crate::importer::sanitizer::starts_with_injection_leader;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static REGION_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\s\-_.]+$").expect("valid regex"));

static COUNTRY_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("valid regex"));

static PRINTABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\x20-\x7E\x{00A0}-\x{10FFFF}]+$").expect("valid regex"));

static ERP_LOCATION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9\-_./\\]+$").expect("valid regex"));

static ERP_ASSET_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9\-_.#/()$&@!%*+=<>?|\\]+$").expect("valid regex")
});

/// 资产状态缺省值
pub const DEFAULT_ASSET_STATUS: &str = "active";

// ==========================================
// 字段规则表
// ==========================================

/// 字段字符集约束
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charset {
    /// 仅长度约束
    Any,
    /// 字母数字、空白、- _ .
    PlainName,
    /// 2-3 位大写字母
    CountryCode,
    /// 可打印字符，不以公式注入字符开头
    Printable,
    ErpLocationId,
    /// 不以公式注入字符开头
    ErpAssetId,
}

impl Charset {
    fn accepts(&self, value: &str) -> bool {
        match self {
            Charset::Any => true,
            Charset::PlainName => REGION_NAME_RE.is_match(value),
            Charset::CountryCode => COUNTRY_CODE_RE.is_match(value),
            Charset::Printable => {
                !starts_with_injection_leader(value) && PRINTABLE_RE.is_match(value)
            }
            Charset::ErpLocationId => ERP_LOCATION_ID_RE.is_match(value),
            Charset::ErpAssetId => {
                !starts_with_injection_leader(value) && ERP_ASSET_ID_RE.is_match(value)
            }
        }
    }

    fn violation(&self, row_number: usize, column: &str, value: &str) -> ImportError {
        match self {
            Charset::CountryCode => ImportError::new(
                row_number,
                ErrorCategory::InvalidCharacters,
                format!(
                    "{} format is invalid (expected 2-3 letter code like US, ID, UK)",
                    column
                ),
            ),
            _ => ImportError::invalid_characters(row_number, column, value),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    column: &'static str,
    required: bool,
    max_len: usize,
    charset: Charset,
    /// 校验前转大写
    uppercase: bool,
}

const fn rule(column: &'static str, required: bool, max_len: usize, charset: Charset) -> FieldRule {
    FieldRule {
        column,
        required,
        max_len,
        charset,
        uppercase: false,
    }
}

const REGION_RULES: &[FieldRule] = &[
    rule(REGION_NAME, true, 100, Charset::PlainName),
    FieldRule {
        column: COUNTRY_CODE,
        required: true,
        max_len: 3,
        charset: Charset::CountryCode,
        uppercase: true,
    },
    rule(BRANCH_NAME, false, 100, Charset::PlainName),
];

const LOCATION_RULES: &[FieldRule] = &[
    rule(NAME, true, 200, Charset::Printable),
    rule(DESCRIPTION, false, 500, Charset::Any),
    rule(ERP_LOCATION_ID, false, 50, Charset::ErpLocationId),
    rule(BRANCH_NAME, false, 100, Charset::PlainName),
];

const ASSET_RULES: &[FieldRule] = &[
    rule(NAME, true, 200, Charset::Printable),
    rule(ERP_ASSET_ID, true, 50, Charset::ErpAssetId),
    rule(BARCODE, false, 100, Charset::Any),
    rule(CATEGORY, false, 100, Charset::Any),
    rule(MODEL, false, 100, Charset::Any),
    rule(BUILD, false, 100, Charset::Any),
    rule(STATUS, false, 50, Charset::Any),
    rule(LOCATION_NAME, false, 200, Charset::Any),
];

/// 各导入类型的规则表
fn rules_for(kind: ImportKind) -> &'static [FieldRule] {
    match kind {
        ImportKind::Regions => REGION_RULES,
        ImportKind::Locations => LOCATION_RULES,
        ImportKind::Assets => ASSET_RULES,
    }
}

/// 通过规则检查的非空字段
struct CheckedFields(HashMap<&'static str, String>);

impl CheckedFields {
    fn take(&mut self, column: &str) -> Option<String> {
        self.0.remove(column)
    }

    /// 必填字段（规则检查已保证存在）
    fn take_required(&mut self, column: &str) -> String {
        self.take(column).unwrap_or_default()
    }
}

fn check_rules(record: &RawRecord, rules: &[FieldRule]) -> Result<CheckedFields, ImportError> {
    let row = record.row_number;

    // ===== 第一轮: 必填 =====
    for rule in rules.iter().filter(|r| r.required) {
        if record.get_non_empty(rule.column).is_none() {
            return Err(ImportError::required(row, rule.column));
        }
    }

    // ===== 第二轮: 长度与字符集 =====
    let mut checked = HashMap::new();
    for rule in rules {
        let Some(raw) = record.get_non_empty(rule.column) else {
            continue;
        };
        let value = if rule.uppercase {
            raw.to_uppercase()
        } else {
            raw.to_string()
        };

        if value.chars().count() > rule.max_len && rule.charset != Charset::CountryCode {
            return Err(ImportError::too_long(row, rule.column, rule.max_len));
        }
        if !rule.charset.accepts(&value) {
            return Err(rule.charset.violation(row, rule.column, &value));
        }
        checked.insert(rule.column, value);
    }

    Ok(CheckedFields(checked))
}

// ==========================================
// 对外接口
// ==========================================

/// 按导入类型校验一行
pub fn validate(kind: ImportKind, record: &RawRecord) -> Result<ValidatedRecord, ImportError> {
    match kind {
        ImportKind::Regions => validate_region(record).map(ValidatedRecord::Region),
        ImportKind::Locations => validate_location(record).map(ValidatedRecord::Location),
        ImportKind::Assets => validate_asset(record).map(ValidatedRecord::Asset),
    }
}

pub fn validate_region(record: &RawRecord) -> Result<RegionInput, ImportError> {
    let mut fields = check_rules(record, rules_for(ImportKind::Regions))?;
    Ok(RegionInput {
        region_name: fields.take_required(REGION_NAME),
        country_code: fields.take_required(COUNTRY_CODE),
        branch_name: fields.take(BRANCH_NAME),
    })
}

pub fn validate_location(record: &RawRecord) -> Result<LocationInput, ImportError> {
    let mut fields = check_rules(record, rules_for(ImportKind::Locations))?;
    Ok(LocationInput {
        name: fields.take_required(NAME),
        erp_location_id: fields.take(ERP_LOCATION_ID),
        branch_name: fields.take(BRANCH_NAME),
        description: fields.take(DESCRIPTION),
    })
}

pub fn validate_asset(record: &RawRecord) -> Result<AssetInput, ImportError> {
    let mut fields = check_rules(record, rules_for(ImportKind::Assets))?;
    Ok(AssetInput {
        name: fields.take_required(NAME),
        erp_asset_id: fields.take_required(ERP_ASSET_ID),
        location_name: fields.take(LOCATION_NAME),
        barcode: fields.take(BARCODE),
        category: fields.take(CATEGORY),
        model: fields.take(MODEL),
        build: fields.take(BUILD),
        status: fields
            .take(STATUS)
            .unwrap_or_else(|| DEFAULT_ASSET_STATUS.to_string()),
    })
}
