// ==========================================
// 订单发货对账系统 - 导入配置
// ==========================================
// 职责: 导入管道的运行参数
// 红线: 只含配置数据，不含业务逻辑
// ==========================================

use serde::{Deserialize, Serialize};

/// 默认批次大小（行）
pub const DEFAULT_BATCH_SIZE: usize = 2000;

/// 批次大小环境变量
pub const BATCH_SIZE_ENV: &str = "ORDER_LEDGER_BATCH_SIZE";

// ==========================================
// IngestConfig - 导入配置
// ==========================================
// batch_size 决定导入管道的内存上限：解码按批暂停，
// 峰值缓冲行数 = batch_size，与文件总行数无关。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 每批行数（>= 1）
    pub batch_size: usize,
    /// 导入渠道标记（写入每条记录的 source 字段）
    pub source_tag: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            source_tag: "file-upload".to_string(),
        }
    }
}

impl IngestConfig {
    /// 从环境变量读取配置（未设置时取默认值）
    ///
    /// # 环境变量
    /// - ORDER_LEDGER_BATCH_SIZE: 每批行数
    pub fn from_env() -> IngestConfig {
        let mut config = IngestConfig::default();
        if let Ok(value) = std::env::var(BATCH_SIZE_ENV) {
            if let Ok(size) = value.trim().parse::<usize>() {
                config.batch_size = size.max(1);
            }
        }
        config
    }

    /// 指定批次大小（最小为 1）
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// 指定导入渠道标记
    pub fn with_source_tag(mut self, source_tag: impl Into<String>) -> Self {
        self.source_tag = source_tag.into();
        self
    }
}
