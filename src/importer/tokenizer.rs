// ==========================================
// 资产主数据导入 - 行分词器
// ==========================================
// 职责: 文本 → 行，行 → 字段（支持双引号）
// 规则:
// - 引号外的逗号结束字段，引号内的逗号为字面量
// - 引号内的 "" 表示一个字面双引号
// - 未闭合的引号延续到行尾（不支持跨行记录）
// - 每个字段都经过 sanitize_cell
// ==========================================

use crate::importer::sanitizer::{sanitize_cell, strip_bom};

/// 一条非空源行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    /// 文件行号（从 1 开始）
    pub row_number: usize,
    pub text: &'a str,
}

/// 将文本按行切分
///
/// # 说明
/// - 去除文件开头的 BOM 与每行行尾的 `\r`
/// - 空白行被跳过（不计入行数），行号保持为物理行号
pub fn split_lines(text: &str) -> Vec<SourceLine<'_>> {
    strip_bom(text)
        .split('\n')
        .enumerate()
        .map(|(idx, line)| SourceLine {
            row_number: idx + 1,
            text: line.strip_suffix('\r').unwrap_or(line),
        })
        .filter(|line| !line.text.trim().is_empty())
        .collect()
}

/// 将一行切分为字段
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(sanitize_cell(&std::mem::take(&mut current))),
            _ => current.push(c),
        }
    }
    fields.push(sanitize_cell(&current));

    fields
}

/// 解析表头行：同 tokenize_line，另外去除全部字面双引号
pub fn parse_header(line: &str) -> Vec<String> {
    tokenize_line(strip_bom(line))
        .into_iter()
        .map(|h| h.replace('"', "").trim().to_string())
        .collect()
}
