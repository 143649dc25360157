// ==========================================
// 订单发货对账系统 - 台账仓储 SQLite 实现
// ==========================================
// 职责: 双台账的条件更新插入 + 原子对账扣减
// 对齐: db.rs pending_orders / order_history 表结构
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::types::{Ledger, OrderStatus};
use crate::domain::{NaturalKey, OrderRecord, PendingMatchKey, ReconcileOutcome};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::ledger_repo::LedgerRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

// ==========================================
// LedgerRepositoryImpl
// ==========================================
pub struct LedgerRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerRepositoryImpl {
    /// 打开数据库并初始化台账 schema
    pub fn new(db_path: &str) -> RepositoryResult<LedgerRepositoryImpl> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn)?;

        Ok(LedgerRepositoryImpl {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 复用已打开的连接（测试/嵌入场景）
    pub fn from_connection(conn: Connection) -> RepositoryResult<LedgerRepositoryImpl> {
        init_schema(&conn)?;
        Ok(LedgerRepositoryImpl {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 单台账的更新插入语句
    ///
    /// natural_key 冲突时原地覆盖业务字段；created_at 保留首次
    /// 入库时间，updated_at 取本次时间。
    fn upsert_sql(table: &str) -> String {
        format!(
            r#"
            INSERT INTO {table} (
                natural_key,
                po_number, so_number, order_number, line_item_number,
                product_code, part_number, size, drawing_number,
                customer_name, customer_code,
                quantity, dispatch_quantity, pending_quantity,
                gross_weight, charge_weight, rate,
                so_date, order_date, dispatch_date,
                expected_delivery_date, pack_slip_date, invoice_date,
                invoice_number, truck_number, transport,
                department_remark, so_special_remark, die_indent,
                status, source, raw,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20,
                ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                ?31, ?32, ?33, ?34
            )
            ON CONFLICT(natural_key) DO UPDATE SET
                po_number = excluded.po_number,
                so_number = excluded.so_number,
                order_number = excluded.order_number,
                line_item_number = excluded.line_item_number,
                product_code = excluded.product_code,
                part_number = excluded.part_number,
                size = excluded.size,
                drawing_number = excluded.drawing_number,
                customer_name = excluded.customer_name,
                customer_code = excluded.customer_code,
                quantity = excluded.quantity,
                dispatch_quantity = excluded.dispatch_quantity,
                pending_quantity = excluded.pending_quantity,
                gross_weight = excluded.gross_weight,
                charge_weight = excluded.charge_weight,
                rate = excluded.rate,
                so_date = excluded.so_date,
                order_date = excluded.order_date,
                dispatch_date = excluded.dispatch_date,
                expected_delivery_date = excluded.expected_delivery_date,
                pack_slip_date = excluded.pack_slip_date,
                invoice_date = excluded.invoice_date,
                invoice_number = excluded.invoice_number,
                truck_number = excluded.truck_number,
                transport = excluded.transport,
                department_remark = excluded.department_remark,
                so_special_remark = excluded.so_special_remark,
                die_indent = excluded.die_indent,
                status = excluded.status,
                source = excluded.source,
                raw = excluded.raw,
                updated_at = excluded.updated_at
            "#
        )
    }
}

/// 从查询行还原标准订单记录
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<OrderRecord> {
    let status_text: String = row.get("status")?;
    let raw_text: String = row.get("raw")?;

    Ok(OrderRecord {
        po_number: row.get("po_number")?,
        so_number: row.get("so_number")?,
        order_number: row.get("order_number")?,
        line_item_number: row.get("line_item_number")?,
        product_code: row.get("product_code")?,
        part_number: row.get("part_number")?,
        size: row.get("size")?,
        drawing_number: row.get("drawing_number")?,
        customer_name: row.get("customer_name")?,
        customer_code: row.get("customer_code")?,
        quantity: row.get("quantity")?,
        dispatch_quantity: row.get("dispatch_quantity")?,
        pending_quantity: row.get("pending_quantity")?,
        gross_weight: row.get("gross_weight")?,
        charge_weight: row.get("charge_weight")?,
        rate: row.get("rate")?,
        so_date: row.get("so_date")?,
        order_date: row.get("order_date")?,
        dispatch_date: row.get("dispatch_date")?,
        expected_delivery_date: row.get("expected_delivery_date")?,
        pack_slip_date: row.get("pack_slip_date")?,
        invoice_date: row.get("invoice_date")?,
        invoice_number: row.get("invoice_number")?,
        truck_number: row.get("truck_number")?,
        transport: row.get("transport")?,
        department_remark: row.get("department_remark")?,
        so_special_remark: row.get("so_special_remark")?,
        die_indent: row.get("die_indent")?,
        status: OrderStatus::from_str_opt(&status_text),
        source: row.get("source")?,
        raw: serde_json::from_str(&raw_text).unwrap_or(serde_json::Value::Null),
    })
}

#[async_trait]
impl LedgerRepository for LedgerRepositoryImpl {
    async fn upsert_batch(
        &self,
        ledger: Ledger,
        records: &[OrderRecord],
    ) -> RepositoryResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let now = Utc::now().to_rfc3339();
        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut count = 0;
        {
            let mut stmt = tx.prepare(&Self::upsert_sql(ledger.table()))?;
            for record in records {
                let key = NaturalKey::for_record(record, ledger);
                let status = record.status.unwrap_or_else(|| ledger.status());
                let raw_json = serde_json::to_string(&record.raw)?;

                stmt.execute(params![
                    key.storage_key(),
                    record.po_number,
                    record.so_number,
                    record.order_number,
                    record.line_item_number,
                    record.product_code,
                    record.part_number,
                    record.size,
                    record.drawing_number,
                    record.customer_name,
                    record.customer_code,
                    record.quantity,
                    record.dispatch_quantity,
                    record.pending_quantity,
                    record.gross_weight,
                    record.charge_weight,
                    record.rate,
                    record.so_date,
                    record.order_date,
                    record.dispatch_date,
                    record.expected_delivery_date,
                    record.pack_slip_date,
                    record.invoice_date,
                    record.invoice_number,
                    record.truck_number,
                    record.transport,
                    record.department_remark,
                    record.so_special_remark,
                    record.die_indent,
                    status.as_str(),
                    record.source,
                    raw_json,
                    now,
                    now,
                ])?;
                count += 1;
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(count)
    }

    async fn reconcile_dispatch(
        &self,
        key: &PendingMatchKey,
        dispatch_quantity: f64,
    ) -> RepositoryResult<ReconcileOutcome> {
        let mut conn = self.lock_conn()?;

        // 立即写事务：读取与扣减在同一把写锁下完成，
        // 并发上传对同一待发行不会读到过期数量
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let matched: Option<(i64, f64)> = tx
            .query_row(
                "SELECT id, pending_quantity FROM pending_orders
                 WHERE po_number = ?1 AND product_code = ?2 AND size = ?3
                 LIMIT 1",
                params![key.po_number, key.product_code, key.size],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let outcome = match matched {
            None => ReconcileOutcome::NoMatch,
            Some((id, current)) => {
                let remaining = current - dispatch_quantity;
                if remaining <= 0.0 {
                    // 完全履约：删除待发行
                    tx.execute("DELETE FROM pending_orders WHERE id = ?1", params![id])?;
                    ReconcileOutcome::Satisfied
                } else {
                    tx.execute(
                        "UPDATE pending_orders
                         SET pending_quantity = ?2, updated_at = ?3
                         WHERE id = ?1",
                        params![id, remaining, Utc::now().to_rfc3339()],
                    )?;
                    ReconcileOutcome::Reduced { remaining }
                }
            }
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(outcome)
    }

    async fn find_pending(
        &self,
        key: &PendingMatchKey,
    ) -> RepositoryResult<Option<OrderRecord>> {
        let conn = self.lock_conn()?;
        let record = conn
            .query_row(
                "SELECT * FROM pending_orders
                 WHERE po_number = ?1 AND product_code = ?2 AND size = ?3
                 LIMIT 1",
                params![key.po_number, key.product_code, key.size],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    async fn find_by_natural_key(
        &self,
        ledger: Ledger,
        key: &NaturalKey,
    ) -> RepositoryResult<Option<OrderRecord>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT * FROM {} WHERE natural_key = ?1 LIMIT 1",
            ledger.table()
        );
        let record = conn
            .query_row(&sql, params![key.storage_key()], record_from_row)
            .optional()?;
        Ok(record)
    }

    async fn count(&self, ledger: Ledger) -> RepositoryResult<usize> {
        let conn = self.lock_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", ledger.table());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_repo() -> LedgerRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        LedgerRepositoryImpl::from_connection(conn).unwrap()
    }

    fn record(po: &str, product: &str, size: &str) -> OrderRecord {
        OrderRecord {
            po_number: po.to_string(),
            product_code: product.to_string(),
            size: size.to_string(),
            so_number: "SO1".to_string(),
            ..OrderRecord::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let repo = test_repo();

        let mut first = record("PO1", "C1", "M");
        first.pending_quantity = 100.0;
        assert_eq!(
            repo.upsert_batch(Ledger::Pending, &[first.clone()]).await.unwrap(),
            1
        );
        assert_eq!(repo.count(Ledger::Pending).await.unwrap(), 1);

        // 同自然键重复写入：原地更新，不新增
        first.pending_quantity = 80.0;
        repo.upsert_batch(Ledger::Pending, &[first.clone()]).await.unwrap();
        assert_eq!(repo.count(Ledger::Pending).await.unwrap(), 1);

        let stored = repo
            .find_pending(&PendingMatchKey::for_record(&first))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.pending_quantity, 80.0);
    }

    #[tokio::test]
    async fn test_upsert_distinct_keys() {
        let repo = test_repo();
        let records = vec![record("PO1", "C1", "M"), record("PO1", "C1", "L")];
        assert_eq!(
            repo.upsert_batch(Ledger::Pending, &records).await.unwrap(),
            2
        );
        assert_eq!(repo.count(Ledger::Pending).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_upsert_empty_batch() {
        let repo = test_repo();
        assert_eq!(repo.upsert_batch(Ledger::Pending, &[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_reduces_pending() {
        let repo = test_repo();
        let mut pending = record("PO1", "C1", "M");
        pending.pending_quantity = 100.0;
        repo.upsert_batch(Ledger::Pending, &[pending.clone()]).await.unwrap();

        let key = PendingMatchKey::for_record(&pending);
        let outcome = repo.reconcile_dispatch(&key, 40.0).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Reduced { remaining: 60.0 });

        let stored = repo.find_pending(&key).await.unwrap().unwrap();
        assert_eq!(stored.pending_quantity, 60.0);
    }

    #[tokio::test]
    async fn test_reconcile_deletes_when_satisfied() {
        let repo = test_repo();
        let mut pending = record("PO1", "C1", "M");
        pending.pending_quantity = 100.0;
        repo.upsert_batch(Ledger::Pending, &[pending.clone()]).await.unwrap();

        let key = PendingMatchKey::for_record(&pending);
        let outcome = repo.reconcile_dispatch(&key, 150.0).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Satisfied);
        assert_eq!(repo.count(Ledger::Pending).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_no_match_is_noop() {
        let repo = test_repo();
        let key = PendingMatchKey {
            po_number: "PO-X".to_string(),
            product_code: "C-X".to_string(),
            size: "S".to_string(),
        };
        let outcome = repo.reconcile_dispatch(&key, 10.0).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_find_by_natural_key_per_ledger() {
        let repo = test_repo();
        let mut rec = record("PO2", "C2", "XL");
        rec.invoice_number = "INV7".to_string();

        repo.upsert_batch(Ledger::Dispatched, &[rec.clone()]).await.unwrap();

        let history_key = NaturalKey::for_record(&rec, Ledger::Dispatched);
        let found = repo
            .find_by_natural_key(Ledger::Dispatched, &history_key)
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().invoice_number, "INV7");

        // 待发台账无此记录
        let pending_key = NaturalKey::for_record(&rec, Ledger::Pending);
        let missing = repo
            .find_by_natural_key(Ledger::Pending, &pending_key)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_raw_round_trip() {
        let repo = test_repo();
        let mut rec = record("PO3", "C3", "S");
        rec.raw = serde_json::json!({"Order No": "PO3", "Extra": "kept"});
        repo.upsert_batch(Ledger::Pending, &[rec.clone()]).await.unwrap();

        let stored = repo
            .find_pending(&PendingMatchKey::for_record(&rec))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.raw["Extra"], "kept");
    }
}
