// ==========================================
// 订单发货对账系统 - 导入层
// ==========================================
// 职责: 订单文件导入管道（解码 → 映射 → 标准化 →
//       按批落库 → 发货对账）
// 支持: CSV（流式）, Excel（整表）
// ==========================================

// 模块声明
pub mod batcher;
pub mod canonicalizer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod order_ingestor_impl;
pub mod order_ingestor_trait;
pub mod reconciler;

// 重导出核心类型
pub use batcher::RowBatcher;
pub use canonicalizer::RecordCanonicalizer;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, RawRow};
pub use file_parser::{CsvRowStream, ExcelParser, FileFormat};
pub use order_ingestor_impl::OrderIngestorImpl;
pub use order_ingestor_trait::OrderIngestor;
pub use reconciler::Reconciler;
