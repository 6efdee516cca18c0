// ==========================================
// 资产主数据导入 - 参考数据 Repository 实现
// ==========================================
// 职责: 基于 rusqlite 的参考数据读取与 upsert
// 幂等: 同一记录重复写入返回 Unchanged，不产生新行
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::record::{ResolvedAsset, ResolvedLocation, ResolvedRegion};
use crate::domain::types::{EntityType, UpsertOutcome};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::reference_store::{ReferenceCounts, ReferenceEntry, ReferenceStore};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::error::Error;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SqliteReferenceStore
// ==========================================
pub struct SqliteReferenceStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReferenceStore {
    /// 创建新的 Repository 实例（确保 schema 就绪）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与其他 Repository 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入或更新国家（国家为预置数据，不经由 CSV 导入）
    ///
    /// # 返回
    /// - Ok(i64): 国家 id
    pub fn upsert_country(&self, code: &str, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO countries (code, name) VALUES (?1, ?2)
            ON CONFLICT(code) DO UPDATE SET name = excluded.name
            "#,
            params![code.trim().to_uppercase(), name.trim()],
        )?;
        let id = conn.query_row(
            "SELECT id FROM countries WHERE code = ?1",
            params![code.trim()],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 按 名称 查找或创建，返回 (id, 是否新建)
    fn find_or_insert_scoped(
        tx: &Transaction,
        table: &str,
        scope_column: &str,
        scope_id: i64,
        name: &str,
    ) -> RepositoryResult<(i64, bool)> {
        let select = format!(
            "SELECT id FROM {} WHERE {} = ?1 AND name = ?2",
            table, scope_column
        );
        if let Some(id) = tx
            .query_row(&select, params![scope_id, name], |row| row.get::<_, i64>(0))
            .optional()?
        {
            return Ok((id, false));
        }

        let insert = format!("INSERT INTO {} (name, {}) VALUES (?1, ?2)", table, scope_column);
        tx.execute(&insert, params![name, scope_id])?;
        Ok((tx.last_insert_rowid(), true))
    }
}

#[async_trait]
impl ReferenceStore for SqliteReferenceStore {
    async fn load_reference_entries(
        &self,
        entity: EntityType,
    ) -> RepositoryResult<Vec<ReferenceEntry>> {
        let conn = self.get_conn()?;
        let sql = match entity {
            EntityType::Country => "SELECT id, code FROM countries ORDER BY id",
            EntityType::Region => "SELECT id, name FROM regions ORDER BY id",
            EntityType::Branch => "SELECT id, name FROM branches ORDER BY id",
            EntityType::Location => "SELECT id, name FROM locations ORDER BY id",
        };

        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(ReferenceEntry {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    async fn upsert_region(&self, record: &ResolvedRegion) -> RepositoryResult<UpsertOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let (region_id, region_created) = Self::find_or_insert_scoped(
            &tx,
            "regions",
            "country_id",
            record.country_id,
            &record.region_name,
        )?;

        let branch_created = match &record.branch_name {
            Some(branch_name) => {
                Self::find_or_insert_scoped(&tx, "branches", "region_id", region_id, branch_name)?
                    .1
            }
            None => false,
        };

        tx.commit()?;

        if region_created || branch_created {
            Ok(UpsertOutcome::Created)
        } else {
            Ok(UpsertOutcome::Unchanged)
        }
    }

    async fn upsert_location(&self, record: &ResolvedLocation) -> RepositoryResult<UpsertOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        // name 列为 COLLATE NOCASE，比较不区分大小写
        let existing = tx
            .query_row(
                r#"
                SELECT id, name, erp_location_id, branch_id, description
                FROM locations WHERE name = ?1
                "#,
                params![record.name],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        ResolvedLocation {
                            name: row.get(1)?,
                            erp_location_id: row.get(2)?,
                            branch_id: row.get(3)?,
                            description: row.get(4)?,
                        },
                    ))
                },
            )
            .optional()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    r#"
                    INSERT INTO locations (name, erp_location_id, branch_id, description)
                    VALUES (?1, ?2, ?3, ?4)
                    "#,
                    params![
                        record.name,
                        record.erp_location_id,
                        record.branch_id,
                        record.description
                    ],
                )?;
                UpsertOutcome::Created
            }
            Some((_, ref current)) if current == record => UpsertOutcome::Unchanged,
            Some((id, _)) => {
                tx.execute(
                    r#"
                    UPDATE locations
                    SET name = ?1, erp_location_id = ?2, branch_id = ?3, description = ?4,
                        updated_at = datetime('now')
                    WHERE id = ?5
                    "#,
                    params![
                        record.name,
                        record.erp_location_id,
                        record.branch_id,
                        record.description,
                        id
                    ],
                )?;
                UpsertOutcome::Updated
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    async fn upsert_asset(&self, record: &ResolvedAsset) -> RepositoryResult<UpsertOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let existing = tx
            .query_row(
                r#"
                SELECT id, name, erp_asset_id, location_id, barcode, category, model, build, status
                FROM assets WHERE erp_asset_id = ?1
                "#,
                params![record.erp_asset_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        ResolvedAsset {
                            name: row.get(1)?,
                            erp_asset_id: row.get(2)?,
                            location_id: row.get(3)?,
                            barcode: row.get(4)?,
                            category: row.get(5)?,
                            model: row.get(6)?,
                            build: row.get(7)?,
                            status: row.get(8)?,
                        },
                    ))
                },
            )
            .optional()?;

        let outcome = match existing {
            None => {
                tx.execute(
                    r#"
                    INSERT INTO assets (
                        erp_asset_id, name, location_id, barcode, category, model, build, status
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    params![
                        record.erp_asset_id,
                        record.name,
                        record.location_id,
                        record.barcode,
                        record.category,
                        record.model,
                        record.build,
                        record.status
                    ],
                )?;
                UpsertOutcome::Created
            }
            Some((_, ref current)) if current == record => UpsertOutcome::Unchanged,
            Some((id, _)) => {
                tx.execute(
                    r#"
                    UPDATE assets
                    SET name = ?1, location_id = ?2, barcode = ?3, category = ?4,
                        model = ?5, build = ?6, status = ?7, updated_at = datetime('now')
                    WHERE id = ?8
                    "#,
                    params![
                        record.name,
                        record.location_id,
                        record.barcode,
                        record.category,
                        record.model,
                        record.build,
                        record.status,
                        id
                    ],
                )?;
                UpsertOutcome::Updated
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    async fn count_reference_data(&self) -> RepositoryResult<ReferenceCounts> {
        let conn = self.get_conn()?;
        let assets: i64 = conn.query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
        let locations: i64 =
            conn.query_row("SELECT COUNT(*) FROM locations", [], |row| row.get(0))?;

        Ok(ReferenceCounts {
            assets: assets.max(0) as u64,
            locations: locations.max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn setup() -> (NamedTempFile, SqliteReferenceStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = SqliteReferenceStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (temp_file, store)
    }

    fn asset(erp_id: &str, name: &str) -> ResolvedAsset {
        ResolvedAsset {
            name: name.to_string(),
            erp_asset_id: erp_id.to_string(),
            location_id: None,
            barcode: None,
            category: Some("Pump".to_string()),
            model: None,
            build: None,
            status: "active".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_asset_created_unchanged_updated() {
        let (_tmp, store) = setup();

        let first = asset("ERP-1", "Main pump");
        assert_eq!(store.upsert_asset(&first).await.unwrap(), UpsertOutcome::Created);
        assert_eq!(store.upsert_asset(&first).await.unwrap(), UpsertOutcome::Unchanged);

        let renamed = asset("ERP-1", "Main pump v2");
        assert_eq!(store.upsert_asset(&renamed).await.unwrap(), UpsertOutcome::Updated);

        let counts = store.count_reference_data().await.unwrap();
        assert_eq!(counts.assets, 1);
    }

    #[tokio::test]
    async fn test_upsert_region_creates_region_and_branch_once() {
        let (_tmp, store) = setup();
        let country_id = store.upsert_country("us", "United States").unwrap();

        let record = ResolvedRegion {
            region_name: "West".to_string(),
            country_id,
            branch_name: Some("Seattle".to_string()),
        };
        assert_eq!(store.upsert_region(&record).await.unwrap(), UpsertOutcome::Created);
        assert_eq!(store.upsert_region(&record).await.unwrap(), UpsertOutcome::Unchanged);

        let branches = store.load_reference_entries(EntityType::Branch).await.unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "Seattle");

        let countries = store.load_reference_entries(EntityType::Country).await.unwrap();
        assert_eq!(countries[0].name, "US");
    }

    #[tokio::test]
    async fn test_location_name_is_case_insensitive_key() {
        let (_tmp, store) = setup();
        let mut record = ResolvedLocation {
            name: "Warehouse A".to_string(),
            erp_location_id: Some("LOC-1".to_string()),
            branch_id: None,
            description: None,
        };
        assert_eq!(store.upsert_location(&record).await.unwrap(), UpsertOutcome::Created);

        record.name = "WAREHOUSE A".to_string();
        assert_eq!(store.upsert_location(&record).await.unwrap(), UpsertOutcome::Updated);

        let locations = store.load_reference_entries(EntityType::Location).await.unwrap();
        assert_eq!(locations.len(), 1);
    }
}
