// ==========================================
// 资产主数据导入 - 参考数据 Repository Trait
// ==========================================
// 职责: 定义参考数据读取与按自然键 upsert 的接口（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::record::{ResolvedAsset, ResolvedLocation, ResolvedRegion};
use crate::domain::types::{EntityType, UpsertOutcome};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

/// 引用索引条目（名称 → id）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub id: i64,
    /// 国家为 code，其余实体为 name
    pub name: String,
}

/// 参考数据计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceCounts {
    pub assets: u64,
    pub locations: u64,
}

// ==========================================
// ReferenceStore Trait
// ==========================================
// 用途: 导入引擎访问后端存储的唯一入口
// 实现者: SqliteReferenceStore（使用 rusqlite）
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    // ===== 引用索引 =====

    /// 读取某实体类型的全部 名称 → id 条目
    ///
    /// # 参数
    /// - entity: 实体类型
    ///
    /// # 返回
    /// - Ok(Vec<ReferenceEntry>): 按 id 升序
    /// - Err: 存储不可达
    async fn load_reference_entries(
        &self,
        entity: EntityType,
    ) -> RepositoryResult<Vec<ReferenceEntry>>;

    // ===== 按自然键 upsert =====

    /// 查找或创建区域（按 国家 + 名称），再查找或创建分支（按 区域 + 名称）
    ///
    /// # 返回
    /// - Created: 区域或分支至少新建其一
    /// - Unchanged: 均已存在
    async fn upsert_region(&self, record: &ResolvedRegion) -> RepositoryResult<UpsertOutcome>;

    /// 按位置名称（不区分大小写）upsert
    async fn upsert_location(&self, record: &ResolvedLocation) -> RepositoryResult<UpsertOutcome>;

    /// 按 erp_asset_id upsert
    async fn upsert_asset(&self, record: &ResolvedAsset) -> RepositoryResult<UpsertOutcome>;

    // ===== 统计 =====

    async fn count_reference_data(&self) -> RepositoryResult<ReferenceCounts>;
}
