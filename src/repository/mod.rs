// ==========================================
// 订单发货对账系统 - 仓储层
// ==========================================
// 职责: 待发/发货双台账的数据访问
// ==========================================

// 模块声明
pub mod error;
pub mod ledger_repo;
pub mod ledger_repo_impl;

// 重导出核心类型
pub use error::{RepositoryError, RepositoryResult};
pub use ledger_repo::LedgerRepository;
pub use ledger_repo_impl::LedgerRepositoryImpl;
