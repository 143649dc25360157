// ==========================================
// 订单发货对账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 订单文件流式导入 + 待发/发货双台账对账
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 台账数据访问
pub mod repository;

// 导入层 - 订单文件导入与对账
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Ledger, OrderStatus};

// 领域实体
pub use domain::{
    IngestReport, NaturalKey, OrderRecord, PendingMatchKey, ReconcileOutcome, ReconcileStats,
};

// 导入层
pub use importer::{
    CsvRowStream, ExcelParser, FieldMapper, FileFormat, ImportError, ImportResult,
    OrderIngestor, OrderIngestorImpl, RecordCanonicalizer, Reconciler, RowBatcher,
};

// 仓储层
pub use repository::{LedgerRepository, LedgerRepositoryImpl, RepositoryError, RepositoryResult};

// 配置
pub use config::IngestConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单发货对账系统";
