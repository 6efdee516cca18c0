// ==========================================
// 资产主数据导入 - 实体导入策略
// ==========================================
// 职责: 为通用引擎提供 {校验, 引用解析, upsert} 三项能力
// 实现者: RegionStrategy, LocationStrategy, AssetStrategy
// ==========================================

use crate::domain::record::{
    AssetInput, ImportError, LocationInput, RawRecord, RegionInput, ResolvedAsset,
    ResolvedLocation, ResolvedRegion,
};
use crate::domain::types::{EntityType, ImportKind, UpsertOutcome};
use crate::importer::field_mapper::columns::*;
use crate::importer::resolver::ReferenceSet;
use crate::importer::validator;
use crate::repository::error::RepositoryResult;
use crate::repository::reference_store::ReferenceStore;
use async_trait::async_trait;

// ==========================================
// ImportStrategy Trait
// ==========================================
#[async_trait]
pub trait ImportStrategy: Send + Sync {
    /// 校验后记录
    type Input: Send + Sync;
    /// 解析引用后可直接写库的记录
    type Resolved: Send + Sync;

    fn kind(&self) -> ImportKind;

    /// 必需表头（标准列名）
    fn required_headers(&self) -> &'static [&'static str];

    /// 运行前需要构建索引的实体类型
    fn reference_entities(&self) -> &'static [EntityType];

    /// 字段校验（纯函数）
    fn validate(&self, record: &RawRecord) -> Result<Self::Input, ImportError>;

    /// 自然键（用于错误消息与幂等写入）
    fn natural_key(&self, input: &Self::Input) -> String;

    /// 引用解析；未命中返回 location_lookup 行级错误
    fn resolve(
        &self,
        input: Self::Input,
        refs: &ReferenceSet,
        row_number: usize,
    ) -> Result<Self::Resolved, ImportError>;

    /// 按自然键 upsert
    async fn upsert(
        &self,
        store: &dyn ReferenceStore,
        record: &Self::Resolved,
    ) -> RepositoryResult<UpsertOutcome>;
}

// ==========================================
// RegionStrategy
// ==========================================
// 国家按代码解析；区域与分支查找或创建
pub struct RegionStrategy;

#[async_trait]
impl ImportStrategy for RegionStrategy {
    type Input = RegionInput;
    type Resolved = ResolvedRegion;

    fn kind(&self) -> ImportKind {
        ImportKind::Regions
    }

    fn required_headers(&self) -> &'static [&'static str] {
        &[COUNTRY_CODE, REGION_NAME]
    }

    fn reference_entities(&self) -> &'static [EntityType] {
        &[EntityType::Country]
    }

    fn validate(&self, record: &RawRecord) -> Result<RegionInput, ImportError> {
        validator::validate_region(record)
    }

    fn natural_key(&self, input: &RegionInput) -> String {
        format!("{}/{}", input.country_code, input.region_name)
    }

    fn resolve(
        &self,
        input: RegionInput,
        refs: &ReferenceSet,
        row_number: usize,
    ) -> Result<ResolvedRegion, ImportError> {
        let country_id = refs.resolve(EntityType::Country, &input.country_code, row_number)?;
        Ok(ResolvedRegion {
            region_name: input.region_name,
            country_id,
            branch_name: input.branch_name,
        })
    }

    async fn upsert(
        &self,
        store: &dyn ReferenceStore,
        record: &ResolvedRegion,
    ) -> RepositoryResult<UpsertOutcome> {
        store.upsert_region(record).await
    }
}

// ==========================================
// LocationStrategy
// ==========================================
// 分支为可选引用
pub struct LocationStrategy;

#[async_trait]
impl ImportStrategy for LocationStrategy {
    type Input = LocationInput;
    type Resolved = ResolvedLocation;

    fn kind(&self) -> ImportKind {
        ImportKind::Locations
    }

    fn required_headers(&self) -> &'static [&'static str] {
        &[NAME]
    }

    fn reference_entities(&self) -> &'static [EntityType] {
        &[EntityType::Branch]
    }

    fn validate(&self, record: &RawRecord) -> Result<LocationInput, ImportError> {
        validator::validate_location(record)
    }

    fn natural_key(&self, input: &LocationInput) -> String {
        input.name.clone()
    }

    fn resolve(
        &self,
        input: LocationInput,
        refs: &ReferenceSet,
        row_number: usize,
    ) -> Result<ResolvedLocation, ImportError> {
        let branch_id = match &input.branch_name {
            Some(branch) => Some(refs.resolve(EntityType::Branch, branch, row_number)?),
            None => None,
        };
        Ok(ResolvedLocation {
            name: input.name,
            erp_location_id: input.erp_location_id,
            branch_id,
            description: input.description,
        })
    }

    async fn upsert(
        &self,
        store: &dyn ReferenceStore,
        record: &ResolvedLocation,
    ) -> RepositoryResult<UpsertOutcome> {
        store.upsert_location(record).await
    }
}

// ==========================================
// AssetStrategy
// ==========================================
// 位置为可选引用（列必须存在，值可为空）
pub struct AssetStrategy;

#[async_trait]
impl ImportStrategy for AssetStrategy {
    type Input = AssetInput;
    type Resolved = ResolvedAsset;

    fn kind(&self) -> ImportKind {
        ImportKind::Assets
    }

    fn required_headers(&self) -> &'static [&'static str] {
        &[NAME, ERP_ASSET_ID, LOCATION_NAME]
    }

    fn reference_entities(&self) -> &'static [EntityType] {
        &[EntityType::Location]
    }

    fn validate(&self, record: &RawRecord) -> Result<AssetInput, ImportError> {
        validator::validate_asset(record)
    }

    fn natural_key(&self, input: &AssetInput) -> String {
        input.erp_asset_id.clone()
    }

    fn resolve(
        &self,
        input: AssetInput,
        refs: &ReferenceSet,
        row_number: usize,
    ) -> Result<ResolvedAsset, ImportError> {
        let location_id = match &input.location_name {
            Some(location) => Some(refs.resolve(EntityType::Location, location, row_number)?),
            None => None,
        };
        Ok(ResolvedAsset {
            name: input.name,
            erp_asset_id: input.erp_asset_id,
            location_id,
            barcode: input.barcode,
            category: input.category,
            model: input.model,
            build: input.build,
            status: input.status,
        })
    }

    async fn upsert(
        &self,
        store: &dyn ReferenceStore,
        record: &ResolvedAsset,
    ) -> RepositoryResult<UpsertOutcome> {
        store.upsert_asset(record).await
    }
}
