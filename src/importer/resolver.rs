// ==========================================
// 资产主数据导入 - 引用解析器
// ==========================================
// 职责: 每次运行、每种实体类型只读取一次存储，构建 名称 → id 索引
// 匹配: trim + 小写后精确匹配，不做模糊匹配
// ==========================================

use crate::domain::record::ImportError;
use crate::domain::types::{EntityType, ErrorCategory};
use crate::repository::error::RepositoryResult;
use crate::repository::reference_store::{ReferenceEntry, ReferenceStore};
use std::collections::HashMap;

/// 索引键归一化
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ==========================================
// ReferenceIndex
// ==========================================
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    entity: EntityType,
    entries: HashMap<String, i64>,
}

impl ReferenceIndex {
    /// 由条目构建索引；归一化后重名时保留第一个 id
    pub fn from_entries(entity: EntityType, entries: Vec<ReferenceEntry>) -> Self {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            let key = normalize_key(&entry.name);
            if let Some(existing) = map.get(&key) {
                tracing::debug!(
                    entity = %entity,
                    name = %entry.name,
                    kept_id = existing,
                    shadowed_id = entry.id,
                    "引用索引重名，保留先出现的 id"
                );
                continue;
            }
            map.insert(key, entry.id);
        }

        Self {
            entity,
            entries: map,
        }
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按名称解析
    pub fn lookup(&self, name: &str) -> Option<i64> {
        self.entries.get(&normalize_key(name)).copied()
    }

    /// 按名称解析；未命中时生成行级 location_lookup 错误
    pub fn resolve(&self, name: &str, row_number: usize) -> Result<i64, ImportError> {
        self.lookup(name).ok_or_else(|| {
            ImportError::new(
                row_number,
                ErrorCategory::LocationLookup,
                format!("{} \"{}\" not found", self.entity.display_name(), name),
            )
        })
    }
}

/// 从存储读取并构建单个索引
pub async fn build_index(
    store: &dyn ReferenceStore,
    entity: EntityType,
) -> RepositoryResult<ReferenceIndex> {
    let entries = store.load_reference_entries(entity).await?;
    let index = ReferenceIndex::from_entries(entity, entries);
    tracing::debug!(entity = %entity, size = index.len(), "引用索引已构建");
    Ok(index)
}

// ==========================================
// ReferenceSet - 一次运行所需的全部索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    indexes: HashMap<EntityType, ReferenceIndex>,
}

impl ReferenceSet {
    /// 依次构建所需实体类型的索引（存储读取次数 = 实体类型数）
    pub async fn build(
        store: &dyn ReferenceStore,
        entities: &[EntityType],
    ) -> RepositoryResult<Self> {
        let mut indexes = HashMap::new();
        for entity in entities {
            if indexes.contains_key(entity) {
                continue;
            }
            indexes.insert(*entity, build_index(store, *entity).await?);
        }
        Ok(Self { indexes })
    }

    pub fn insert(&mut self, index: ReferenceIndex) {
        self.indexes.insert(index.entity(), index);
    }

    pub fn get(&self, entity: EntityType) -> Option<&ReferenceIndex> {
        self.indexes.get(&entity)
    }

    /// 解析引用；索引未构建时按未命中处理
    pub fn resolve(
        &self,
        entity: EntityType,
        name: &str,
        row_number: usize,
    ) -> Result<i64, ImportError> {
        match self.indexes.get(&entity) {
            Some(index) => index.resolve(name, row_number),
            None => ReferenceIndex::from_entries(entity, Vec::new()).resolve(name, row_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, name: &str) -> ReferenceEntry {
        ReferenceEntry {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_case_insensitive_exact_match() {
        let index = ReferenceIndex::from_entries(
            EntityType::Location,
            vec![entry(1, "Warehouse A"), entry(2, "Yard")],
        );
        assert_eq!(index.lookup("warehouse a"), Some(1));
        assert_eq!(index.lookup("  WAREHOUSE A "), Some(1));
        assert_eq!(index.lookup("Warehouse"), None);
    }

    #[test]
    fn test_first_id_wins_on_duplicate() {
        let index = ReferenceIndex::from_entries(
            EntityType::Branch,
            vec![entry(7, "Central"), entry(9, "central")],
        );
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup("CENTRAL"), Some(7));
    }

    #[test]
    fn test_miss_produces_lookup_error() {
        let index = ReferenceIndex::from_entries(EntityType::Location, vec![]);
        let err = index.resolve("Dock 9", 4).unwrap_err();
        assert_eq!(err.category, ErrorCategory::LocationLookup);
        assert_eq!(err.message, "Row 4: Location \"Dock 9\" not found");
    }

    #[test]
    fn test_reference_set_missing_index_is_miss() {
        let mut set = ReferenceSet::default();
        set.insert(ReferenceIndex::from_entries(EntityType::Country, vec![entry(1, "US")]));
        assert_eq!(set.resolve(EntityType::Country, "us", 2).unwrap(), 1);
        assert!(set.resolve(EntityType::Branch, "x", 2).is_err());
    }
}
