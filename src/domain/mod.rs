// ==========================================
// 订单发货对账系统 - 领域层
// ==========================================
// 职责: 领域实体与基础类型定义
// 红线: 不含 I/O，不依赖仓储/导入层
// ==========================================

pub mod order;
pub mod types;

pub use order::{
    IngestReport, NaturalKey, OrderRecord, PendingMatchKey, ReconcileOutcome, ReconcileStats,
};
pub use types::{Ledger, OrderStatus};
