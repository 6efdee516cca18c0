// ==========================================
// 资产主数据导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::import_settings::ImportSettings;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析配置；缺失或非法时回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(value) => Ok(value),
                Err(_) => {
                    tracing::warn!(
                        "配置值非法，使用默认值: key={}, value={}, default={}",
                        key,
                        raw,
                        default
                    );
                    Ok(default)
                }
            },
        }
    }

    /// 获取 global scope 配置快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn load_import_settings(&self) -> ConfigResult<ImportSettings> {
        let defaults = ImportSettings::default();

        let settings = ImportSettings {
            max_file_bytes: self
                .get_parsed_or_default(config_keys::MAX_FILE_BYTES, defaults.max_file_bytes)?,
            max_text_bytes: self
                .get_parsed_or_default(config_keys::MAX_TEXT_BYTES, defaults.max_text_bytes)?,
            max_rows: self.get_parsed_or_default(config_keys::MAX_ROWS, defaults.max_rows)?,
            batch_size: self.get_parsed_or_default(config_keys::BATCH_SIZE, defaults.batch_size)?,
            heartbeat_every_batches: self.get_parsed_or_default(
                config_keys::HEARTBEAT_EVERY_BATCHES,
                defaults.heartbeat_every_batches,
            )?,
            download_timeout: Duration::from_millis(self.get_parsed_or_default(
                config_keys::DOWNLOAD_TIMEOUT_MS,
                defaults.download_timeout.as_millis() as u64,
            )?),
            persisted_error_cap: self.get_parsed_or_default(
                config_keys::PERSISTED_ERROR_CAP,
                defaults.persisted_error_cap,
            )?,
            response_error_cap: self.get_parsed_or_default(
                config_keys::RESPONSE_ERROR_CAP,
                defaults.response_error_cap,
            )?,
            category_sample_cap: self.get_parsed_or_default(
                config_keys::CATEGORY_SAMPLE_CAP,
                defaults.category_sample_cap,
            )?,
            row_write_retries: self
                .get_parsed_or_default(config_keys::ROW_WRITE_RETRIES, defaults.row_write_retries)?,
            retry_backoff: Duration::from_millis(self.get_parsed_or_default(
                config_keys::RETRY_BACKOFF_MS,
                defaults.retry_backoff.as_millis() as u64,
            )?),
        };

        Ok(settings.normalized())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 上限
    pub const MAX_FILE_BYTES: &str = "import.max_file_bytes";
    pub const MAX_TEXT_BYTES: &str = "import.max_text_bytes";
    pub const MAX_ROWS: &str = "import.max_rows";

    // 批处理与心跳
    pub const BATCH_SIZE: &str = "import.batch_size";
    pub const HEARTBEAT_EVERY_BATCHES: &str = "import.heartbeat_every_batches";

    // 下载
    pub const DOWNLOAD_TIMEOUT_MS: &str = "import.download_timeout_ms";

    // 错误样本
    pub const PERSISTED_ERROR_CAP: &str = "import.persisted_error_cap";
    pub const RESPONSE_ERROR_CAP: &str = "import.response_error_cap";
    pub const CATEGORY_SAMPLE_CAP: &str = "import.category_sample_cap";

    // 重试
    pub const ROW_WRITE_RETRIES: &str = "import.row_write_retries";
    pub const RETRY_BACKOFF_MS: &str = "import.retry_backoff_ms";
}
