// ==========================================
// 资产主数据导入 - 导入层
// ==========================================
// 职责: CSV 文本 → 校验 → 引用解析 → 写库
// 支持: regions / locations / assets 三类导入
// ==========================================

// 模块声明
pub mod engine;
pub mod error;
pub mod field_mapper;
pub mod resolver;
pub mod sanitizer;
pub mod strategy;
pub mod tokenizer;
pub mod tracker;
pub mod validator;

// 重导出核心类型
pub use engine::{parse_file, IngestionEngine, ParsedFile};
pub use error::{PipelineError, PipelineResult, GENERIC_FAILURE_MESSAGE};
pub use resolver::{ReferenceIndex, ReferenceSet};
pub use sanitizer::sanitize_cell;
pub use tokenizer::{split_lines, tokenize_line, SourceLine};
pub use tracker::ImportRunTracker;

// 重导出 Trait 接口
pub use strategy::{AssetStrategy, ImportStrategy, LocationStrategy, RegionStrategy};
