// ==========================================
// 订单发货对账系统 - 发货对账器实现
// ==========================================
// 职责: 发货批次落库后，逐条扣减对应的待发台账数量
// 约束: 仅在该批次的发货台账写入确认后执行；
//       单条失败只记为 failed，不阻断批内其余记录
// ==========================================

use crate::domain::{OrderRecord, PendingMatchKey, ReconcileOutcome, ReconcileStats};
use crate::repository::LedgerRepository;
use tracing::{debug, warn};

// ==========================================
// Reconciler - 发货对账器
// ==========================================
// 对账按匹配键 PO+产品+规格 定位待发行（宽于自然键：
// 同一待发行可被多条发货行分批履约），扣减本条发货数量；
// 扣减后 <= 0 即删除待发行并计为完全履约。
// 扣减依赖当前库存状态，只能逐条读改写，换吞吐换正确性。
pub struct Reconciler;

impl Reconciler {
    /// 对一个已落库的发货批次执行对账
    pub async fn reconcile_batch<R>(&self, repo: &R, records: &[OrderRecord]) -> ReconcileStats
    where
        R: LedgerRepository + ?Sized,
    {
        let mut stats = ReconcileStats::default();

        for record in records {
            let key = PendingMatchKey::for_record(record);

            match repo.reconcile_dispatch(&key, record.dispatch_quantity).await {
                Ok(ReconcileOutcome::Satisfied) => {
                    debug!(
                        po_number = %key.po_number,
                        product_code = %key.product_code,
                        size = %key.size,
                        "待发行完全履约，已删除"
                    );
                    stats.satisfied += 1;
                }
                Ok(ReconcileOutcome::Reduced { remaining }) => {
                    debug!(
                        po_number = %key.po_number,
                        product_code = %key.product_code,
                        size = %key.size,
                        remaining,
                        "待发数量已扣减"
                    );
                    stats.reduced += 1;
                }
                Ok(ReconcileOutcome::NoMatch) => {
                    // 该发货行未被跟踪为待发：正常情况，静默跳过
                    stats.missed += 1;
                }
                Err(err) => {
                    warn!(
                        po_number = %key.po_number,
                        product_code = %key.product_code,
                        size = %key.size,
                        error = %err,
                        "单条对账失败，继续处理批内其余记录"
                    );
                    stats.failed += 1;
                }
            }
        }

        stats
    }
}
