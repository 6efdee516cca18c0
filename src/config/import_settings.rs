// ==========================================
// 资产主数据导入 - 导入参数
// ==========================================
// 职责: 引擎运行时使用的上限 / 批次 / 心跳 / 超时 / 重试参数
// 默认值: 见 Default 实现（可由 config_kv 覆写）
// ==========================================

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    // ===== 上限 =====
    /// 原始文件字节上限
    pub max_file_bytes: u64,
    /// 解码后文本字节上限
    pub max_text_bytes: u64,
    /// 数据行上限（不含表头）
    pub max_rows: usize,

    // ===== 批处理 =====
    pub batch_size: usize,
    /// 每 N 个批次写一次心跳（最后一批必写）
    pub heartbeat_every_batches: usize,

    // ===== 下载 =====
    pub download_timeout: Duration,

    // ===== 错误样本 =====
    /// 持久化到 sync_logs 的错误条数
    pub persisted_error_cap: usize,
    /// 返回给调用方的错误条数
    pub response_error_cap: usize,
    /// 每个分类的样本条数
    pub category_sample_cap: usize,

    // ===== 单行写库重试 =====
    pub row_write_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            max_file_bytes: 20 * 1024 * 1024,
            max_text_bytes: 10 * 1024 * 1024,
            max_rows: 100_000,
            batch_size: 50,
            heartbeat_every_batches: 5,
            download_timeout: Duration::from_secs(30),
            persisted_error_cap: 100,
            response_error_cap: 20,
            category_sample_cap: 5,
            row_write_retries: 2,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

impl ImportSettings {
    /// 修正非法组合（0 值批次 / 心跳间隔）
    pub fn normalized(mut self) -> Self {
        if self.batch_size == 0 {
            self.batch_size = 1;
        }
        if self.heartbeat_every_batches == 0 {
            self.heartbeat_every_batches = 1;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ImportSettings::default();
        assert_eq!(settings.max_rows, 100_000);
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.heartbeat_every_batches, 5);
        assert_eq!(settings.download_timeout, Duration::from_secs(30));
        assert_eq!(settings.persisted_error_cap, 100);
        assert_eq!(settings.response_error_cap, 20);
    }

    #[test]
    fn test_normalized_rejects_zero_batch() {
        let settings = ImportSettings {
            batch_size: 0,
            heartbeat_every_batches: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(settings.batch_size, 1);
        assert_eq!(settings.heartbeat_every_batches, 1);
    }
}
