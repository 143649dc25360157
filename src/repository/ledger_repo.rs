// ==========================================
// 订单发货对账系统 - 台账仓储 Trait
// ==========================================
// 职责: 定义双台账持久化接口（不包含实现）
// 这是导入管道之外各层（HTTP/CLI/报表）唯一依赖的持久化面
// ==========================================

use crate::domain::types::Ledger;
use crate::domain::{NaturalKey, OrderRecord, PendingMatchKey, ReconcileOutcome};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// LedgerRepository Trait
// ==========================================
// 实现者: LedgerRepositoryImpl (SQLite)
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// 批量条件更新插入（按自然键）
    ///
    /// 对批内每条记录构造自然键：已存在同键记录时原地更新字段，
    /// 否则插入新记录。同一文件重复上传收敛为同一组存储记录。
    /// 整批在单个事务中提交；批内任一条失败即整批回滚并返回错误，
    /// 之前批次已提交的数据不受影响。
    ///
    /// # 返回
    /// - Ok(usize): 本批写入（插入或更新）的记录数
    async fn upsert_batch(&self, ledger: Ledger, records: &[OrderRecord])
        -> RepositoryResult<usize>;

    /// 原子对账：按匹配键扣减待发台账数量
    ///
    /// 读取-扣减-落库在单个立即写事务中执行，持有数据库写锁，
    /// 并发上传对同一待发行的扣减串行化而非竞态。
    ///
    /// # 返回
    /// - NoMatch: 无匹配待发行（正常跳过）
    /// - Reduced: 扣减后仍有剩余，已更新
    /// - Satisfied: 扣减后 <= 0，待发行已删除
    async fn reconcile_dispatch(
        &self,
        key: &PendingMatchKey,
        dispatch_quantity: f64,
    ) -> RepositoryResult<ReconcileOutcome>;

    /// 按对账匹配键查询待发台账单条记录
    async fn find_pending(&self, key: &PendingMatchKey)
        -> RepositoryResult<Option<OrderRecord>>;

    /// 按自然键查询台账记录
    async fn find_by_natural_key(
        &self,
        ledger: Ledger,
        key: &NaturalKey,
    ) -> RepositoryResult<Option<OrderRecord>>;

    /// 台账总行数
    async fn count(&self, ledger: Ledger) -> RepositoryResult<usize>;
}
