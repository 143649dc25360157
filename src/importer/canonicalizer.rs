// ==========================================
// 订单发货对账系统 - 记录标准化器实现
// ==========================================
// 职责: 数值收敛（非负化）+ 状态标记 + 自然键构造
// 契约: 收敛是幂等的，对已收敛记录重复调用不改变结果
// ==========================================

use crate::domain::types::Ledger;
use crate::domain::{NaturalKey, OrderRecord, PendingMatchKey};

// ==========================================
// RecordCanonicalizer - 记录标准化器
// ==========================================
pub struct RecordCanonicalizer;

impl RecordCanonicalizer {
    /// 按目标台账标准化记录并构造自然键
    ///
    /// - 数量/财务字段收敛为非负有限数（NaN/负数/非有限 → 0）
    /// - status 按台账设置为 Pending / Dispatched
    pub fn canonicalize(&self, mut record: OrderRecord, ledger: Ledger) -> (OrderRecord, NaturalKey) {
        self.coerce_numbers(&mut record);
        record.status = Some(ledger.status());
        let key = NaturalKey::for_record(&record, ledger);
        (record, key)
    }

    /// 数值字段收敛（幂等）
    pub fn coerce_numbers(&self, record: &mut OrderRecord) {
        record.quantity = clean_num(record.quantity);
        record.dispatch_quantity = clean_num(record.dispatch_quantity);
        record.pending_quantity = clean_num(record.pending_quantity);
        record.gross_weight = clean_num(record.gross_weight);
        record.charge_weight = clean_num(record.charge_weight);
        record.rate = clean_num(record.rate);
    }

    /// 发货对账匹配键（PO+产品+规格，宽于自然键）
    pub fn pending_match_key(&self, record: &OrderRecord) -> PendingMatchKey {
        PendingMatchKey::for_record(record)
    }
}

/// 单值收敛：NaN/非有限/负数 → 0
fn clean_num(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::OrderStatus;

    #[test]
    fn test_clean_num() {
        assert_eq!(clean_num(5.5), 5.5);
        assert_eq!(clean_num(0.0), 0.0);
        assert_eq!(clean_num(-3.0), 0.0);
        assert_eq!(clean_num(f64::NAN), 0.0);
        assert_eq!(clean_num(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_canonicalize_sets_status() {
        let canonicalizer = RecordCanonicalizer;

        let (pending, _) = canonicalizer.canonicalize(OrderRecord::default(), Ledger::Pending);
        assert_eq!(pending.status, Some(OrderStatus::Pending));

        let (dispatched, _) =
            canonicalizer.canonicalize(OrderRecord::default(), Ledger::Dispatched);
        assert_eq!(dispatched.status, Some(OrderStatus::Dispatched));
    }

    #[test]
    fn test_coerce_is_idempotent() {
        let canonicalizer = RecordCanonicalizer;
        let mut record = OrderRecord {
            quantity: -10.0,
            dispatch_quantity: f64::NAN,
            pending_quantity: 77.0,
            rate: 3.25,
            ..OrderRecord::default()
        };

        canonicalizer.coerce_numbers(&mut record);
        let first = record.clone();

        // 再次收敛不改变结果
        canonicalizer.coerce_numbers(&mut record);
        assert_eq!(record, first);

        assert_eq!(record.quantity, 0.0);
        assert_eq!(record.dispatch_quantity, 0.0);
        assert_eq!(record.pending_quantity, 77.0);
        assert_eq!(record.rate, 3.25);
    }

    #[test]
    fn test_canonicalize_builds_ledger_key() {
        let canonicalizer = RecordCanonicalizer;
        let record = OrderRecord {
            po_number: "PO1".to_string(),
            product_code: "C1".to_string(),
            so_number: "SO1".to_string(),
            size: "L".to_string(),
            invoice_number: "INV1".to_string(),
            ..OrderRecord::default()
        };

        let (_, pending_key) = canonicalizer.canonicalize(record.clone(), Ledger::Pending);
        let (_, history_key) = canonicalizer.canonicalize(record, Ledger::Dispatched);

        assert_eq!(pending_key.invoice_number, None);
        assert_eq!(history_key.invoice_number, Some("INV1".to_string()));
    }
}
