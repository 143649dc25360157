// ==========================================
// 订单发货对账系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 双台账同构建表（待发 pending_orders / 发货 order_history）
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 待发台账表名
pub const PENDING_TABLE: &str = "pending_orders";

/// 发货台账表名
pub const HISTORY_TABLE: &str = "order_history";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 单个台账表的建表语句
///
/// 两个台账共用同一字段结构，仅表名不同。
/// natural_key 为业务自然键的拼接串，承担去重唯一约束。
fn ledger_table_ddl(table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            natural_key TEXT NOT NULL UNIQUE,

            -- 订单标识
            po_number TEXT NOT NULL DEFAULT '',
            so_number TEXT NOT NULL DEFAULT '',
            order_number TEXT NOT NULL DEFAULT '',
            line_item_number TEXT NOT NULL DEFAULT '',

            -- 产品信息
            product_code TEXT NOT NULL DEFAULT '',
            part_number TEXT NOT NULL DEFAULT '',
            size TEXT NOT NULL DEFAULT '',
            drawing_number TEXT NOT NULL DEFAULT '',

            -- 客户信息
            customer_name TEXT NOT NULL DEFAULT '',
            customer_code TEXT NOT NULL DEFAULT '',

            -- 数量
            quantity REAL NOT NULL DEFAULT 0,
            dispatch_quantity REAL NOT NULL DEFAULT 0,
            pending_quantity REAL NOT NULL DEFAULT 0,

            -- 财务
            gross_weight REAL NOT NULL DEFAULT 0,
            charge_weight REAL NOT NULL DEFAULT 0,
            rate REAL NOT NULL DEFAULT 0,

            -- 日期（源格式原样字符串）
            so_date TEXT NOT NULL DEFAULT '',
            order_date TEXT NOT NULL DEFAULT '',
            dispatch_date TEXT NOT NULL DEFAULT '',
            expected_delivery_date TEXT NOT NULL DEFAULT '',
            pack_slip_date TEXT NOT NULL DEFAULT '',
            invoice_date TEXT NOT NULL DEFAULT '',

            -- 发运信息
            invoice_number TEXT NOT NULL DEFAULT '',
            truck_number TEXT NOT NULL DEFAULT '',
            transport TEXT NOT NULL DEFAULT '',

            -- 备注
            department_remark TEXT NOT NULL DEFAULT '',
            so_special_remark TEXT NOT NULL DEFAULT '',
            die_indent TEXT NOT NULL DEFAULT '',

            -- 状态与来源
            status TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL DEFAULT '',
            raw TEXT NOT NULL DEFAULT '{{}}',

            -- 审计字段
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#
    )
}

/// 初始化双台账 schema（幂等）
///
/// 索引对齐查询热点：
/// - (po_number, product_code, size) 为发货对账的匹配键
/// - customer_name / expected_delivery_date / dispatch_date / invoice_number 为报表查询入口
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&ledger_table_ddl(PENDING_TABLE))?;
    conn.execute_batch(&ledger_table_ddl(HISTORY_TABLE))?;

    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_pending_orders_match
            ON pending_orders (po_number, product_code, size);
        CREATE INDEX IF NOT EXISTS idx_pending_orders_customer
            ON pending_orders (customer_name);
        CREATE INDEX IF NOT EXISTS idx_pending_orders_delivery
            ON pending_orders (expected_delivery_date);

        CREATE INDEX IF NOT EXISTS idx_order_history_match
            ON order_history (po_number, product_code, size);
        CREATE INDEX IF NOT EXISTS idx_order_history_customer
            ON order_history (customer_name);
        CREATE INDEX IF NOT EXISTS idx_order_history_dispatch_date
            ON order_history (dispatch_date);
        CREATE INDEX IF NOT EXISTS idx_order_history_invoice
            ON order_history (invoice_number);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        // 重复执行不报错
        init_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('pending_orders', 'order_history')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_natural_key_unique() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO pending_orders (natural_key, created_at, updated_at) VALUES ('k1', 't', 't')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO pending_orders (natural_key, created_at, updated_at) VALUES ('k1', 't', 't')",
            [],
        );
        assert!(dup.is_err());
    }
}
