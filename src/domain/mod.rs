// ==========================================
// 资产主数据导入 - 领域层
// ==========================================
// 职责: 领域实体与类型（不含 I/O）
// ==========================================

pub mod import_run;
pub mod record;
pub mod types;

pub use import_run::{
    CategorySamples, DataStats, ErrorBreakdown, ImportRun, ImportSummary, RunCompletion,
    SyncLogFilter,
};
pub use record::{
    AssetInput, Caller, ImportError, ImportRequest, LocationInput, RawRecord, RegionInput,
    ResolvedAsset, ResolvedLocation, ResolvedRegion, ValidatedRecord,
};
pub use types::{EntityType, ErrorCategory, ImportKind, RunStage, RunStatus, UpsertOutcome};
