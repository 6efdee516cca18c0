// ==========================================
// 资产主数据导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_settings::ImportSettings;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 读取导入参数
    ///
    /// # 返回
    /// - Ok(ImportSettings): 未配置或非法的键回退为默认值
    /// - Err: 数据库读取失败
    async fn load_import_settings(&self) -> Result<ImportSettings, Box<dyn Error + Send + Sync>>;
}
