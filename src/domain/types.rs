// ==========================================
// 订单发货对账系统 - 基础类型
// ==========================================
// 职责: 台账标识与订单状态枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Ledger - 目标台账
// ==========================================
// Pending: 待发台账（未发完的订单行，pending_quantity 随发货递减）
// Dispatched: 发货台账（发货历史，只增不删）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ledger {
    Pending,
    Dispatched,
}

impl Ledger {
    /// 对应的存储表名
    pub fn table(&self) -> &'static str {
        match self {
            Ledger::Pending => crate::db::PENDING_TABLE,
            Ledger::Dispatched => crate::db::HISTORY_TABLE,
        }
    }

    /// 入库记录携带的订单状态
    pub fn status(&self) -> OrderStatus {
        match self {
            Ledger::Pending => OrderStatus::Pending,
            Ledger::Dispatched => OrderStatus::Dispatched,
        }
    }

    /// 从命令行/接口入参解析（大小写不敏感）
    pub fn parse(value: &str) -> Option<Ledger> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Ledger::Pending),
            "DISPATCHED" => Some(Ledger::Dispatched),
            _ => None,
        }
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ledger::Pending => write!(f, "PENDING"),
            Ledger::Dispatched => write!(f, "DISPATCHED"),
        }
    }
}

// ==========================================
// OrderStatus - 订单状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Dispatched,
}

impl OrderStatus {
    /// 存储用状态文本
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Dispatched => "Dispatched",
        }
    }

    /// 从存储文本解析
    pub fn from_str_opt(value: &str) -> Option<OrderStatus> {
        match value {
            "Pending" => Some(OrderStatus::Pending),
            "Dispatched" => Some(OrderStatus::Dispatched),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_parse() {
        assert_eq!(Ledger::parse("pending"), Some(Ledger::Pending));
        assert_eq!(Ledger::parse(" DISPATCHED "), Some(Ledger::Dispatched));
        assert_eq!(Ledger::parse("unknown"), None);
    }

    #[test]
    fn test_ledger_status() {
        assert_eq!(Ledger::Pending.status().as_str(), "Pending");
        assert_eq!(Ledger::Dispatched.status().as_str(), "Dispatched");
    }

    #[test]
    fn test_ledger_table() {
        assert_eq!(Ledger::Pending.table(), "pending_orders");
        assert_eq!(Ledger::Dispatched.table(), "order_history");
    }
}
