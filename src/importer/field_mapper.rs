// ==========================================
// 资产主数据导入 - 表头映射器
// ==========================================
// 职责: 源表头 → 标准列名（按导入类型的别名表）
// 规则: trim + 小写后查别名表；未知表头保留原样（之后被忽略）
// ==========================================

use crate::domain::types::ImportKind;

/// 标准列名
pub mod columns {
    pub const REGION_NAME: &str = "region-name";
    pub const COUNTRY_CODE: &str = "country-code";
    pub const BRANCH_NAME: &str = "branch-name";
    pub const NAME: &str = "name";
    pub const ERP_LOCATION_ID: &str = "erp_location_id";
    pub const DESCRIPTION: &str = "description";
    pub const ERP_ASSET_ID: &str = "erp_asset_id";
    pub const LOCATION_NAME: &str = "location-name";
    pub const BARCODE: &str = "barcode";
    pub const CATEGORY: &str = "category";
    pub const MODEL: &str = "model";
    pub const BUILD: &str = "build";
    pub const STATUS: &str = "status";
}

use columns::*;

/// (标准列名, 别名列表)
type AliasTable = &'static [(&'static str, &'static [&'static str])];

const REGION_ALIASES: AliasTable = &[
    (REGION_NAME, &["region_name", "region", "name"]),
    (COUNTRY_CODE, &["country_code", "country", "code"]),
    (BRANCH_NAME, &["branch_name", "branch"]),
];

const LOCATION_ALIASES: AliasTable = &[
    (NAME, &["location-name", "location_name", "location"]),
    (ERP_LOCATION_ID, &["erp-location-id", "erp_id", "location_id"]),
    (BRANCH_NAME, &["branch_name", "branch"]),
    (DESCRIPTION, &["desc"]),
];

const ASSET_ALIASES: AliasTable = &[
    (NAME, &["asset_name", "asset-name", "title"]),
    (ERP_ASSET_ID, &["erp-asset-id", "erp_id", "asset_id"]),
    (LOCATION_NAME, &["location_name", "location"]),
    (BARCODE, &["barcode_id"]),
    (CATEGORY, &["asset_category"]),
    (MODEL, &["asset_model"]),
    (BUILD, &["build_year"]),
    (STATUS, &["asset_status"]),
];

fn alias_table(kind: ImportKind) -> AliasTable {
    match kind {
        ImportKind::Regions => REGION_ALIASES,
        ImportKind::Locations => LOCATION_ALIASES,
        ImportKind::Assets => ASSET_ALIASES,
    }
}

/// 单个表头 → 标准列名
pub fn canonical_column(kind: ImportKind, header: &str) -> String {
    let normalized = header.trim().to_lowercase();

    for (canonical, aliases) in alias_table(kind) {
        if normalized == *canonical || aliases.contains(&normalized.as_str()) {
            return canonical.to_string();
        }
    }
    normalized
}

/// 整行表头映射
pub fn canonicalize_headers(kind: ImportKind, headers: &[String]) -> Vec<String> {
    headers.iter().map(|h| canonical_column(kind, h)).collect()
}

/// 返回缺失的必需列（保持必需列声明顺序）
pub fn missing_columns(headers: &[String], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_aliases() {
        let headers = vec!["Region_Name".to_string(), "COUNTRY".to_string(), "branch".to_string()];
        assert_eq!(
            canonicalize_headers(ImportKind::Regions, &headers),
            vec!["region-name", "country-code", "branch-name"]
        );
    }

    #[test]
    fn test_alias_scope_depends_on_kind() {
        // "location" 在位置导入中是 name，在资产导入中是 location-name
        assert_eq!(canonical_column(ImportKind::Locations, "location"), "name");
        assert_eq!(canonical_column(ImportKind::Assets, "location"), "location-name");
        assert_eq!(canonical_column(ImportKind::Assets, "erp-asset-id"), "erp_asset_id");
    }

    #[test]
    fn test_unknown_header_kept() {
        assert_eq!(canonical_column(ImportKind::Assets, " Serial No "), "serial no");
    }

    #[test]
    fn test_missing_columns() {
        let headers = vec!["name".to_string(), "barcode".to_string()];
        assert_eq!(
            missing_columns(&headers, &["name", "erp_asset_id", "location-name"]),
            vec!["erp_asset_id", "location-name"]
        );
    }
}
