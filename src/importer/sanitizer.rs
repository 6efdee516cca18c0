// ==========================================
// 资产主数据导入 - 单元格清洗器
// ==========================================
// 职责: TRIM + 公式注入中和（= + - @ 开头时前置单引号）
// 约束: 全函数，任何输入都有输出
// ==========================================

/// 可触发电子表格公式执行的首字符
pub const INJECTION_LEADERS: [char; 4] = ['=', '+', '-', '@'];

/// 清洗单个字段
///
/// # 规则
/// - 去除首尾空白
/// - 以 = + - @ 开头时前置 `'`
/// - 空输入返回空串
pub fn sanitize_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if starts_with_injection_leader(trimmed) {
        format!("'{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// 是否以公式注入字符开头
pub fn starts_with_injection_leader(value: &str) -> bool {
    value
        .chars()
        .next()
        .map(|c| INJECTION_LEADERS.contains(&c))
        .unwrap_or(false)
}

/// 空串视为 NULL
pub fn normalize_null(value: Option<&str>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 去除 UTF-8 BOM
pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}
