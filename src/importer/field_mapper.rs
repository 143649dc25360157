// ==========================================
// 订单发货对账系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准订单字段映射 + 类型兜底
// 契约: 全函数，任意原始行都映射为合法 OrderRecord，
//       文本缺失落空串，数值缺失/不可解析落 0，不抛错
// ==========================================

use crate::domain::OrderRecord;
use std::collections::HashMap;

/// 原始行：列名 → 单元格文本
pub type RawRow = HashMap<String, String>;

// ==========================================
// 标准字段别名表
// ==========================================
// 每个标准字段按优先级列出候选源列名。
// 新增来源格式时在此追加别名，映射逻辑不变。
mod aliases {
    pub const PO_NUMBER: &[&str] = &["Order No", "PO No"];
    pub const SO_NUMBER: &[&str] = &["S/O No", "SO No"];
    pub const ORDER_NUMBER: &[&str] = &["Order No"];
    pub const LINE_ITEM_NUMBER: &[&str] = &["PO Srl", "P Srl", "Line"];

    pub const PRODUCT_CODE: &[&str] = &["Item Code", "Produce Code"];
    pub const PART_NUMBER: &[&str] = &["Style No"];
    pub const SIZE: &[&str] = &["Size"];
    pub const DRAWING_NUMBER: &[&str] = &["Drg.No"];

    pub const CUSTOMER_NAME: &[&str] = &["Buyer Name", "Party Name"];
    pub const CUSTOMER_CODE: &[&str] = &["Cust Code"];

    pub const QUANTITY: &[&str] = &["Order Qty"];
    pub const DISPATCH_QUANTITY: &[&str] = &["Sale Qty"];
    pub const PENDING_QUANTITY: &[&str] = &["O/S Ord.Qty"];

    pub const GROSS_WEIGHT: &[&str] = &["Gross Wt"];
    pub const CHARGE_WEIGHT: &[&str] = &["Chg.Wt"];
    pub const RATE: &[&str] = &["Rate"];

    pub const SO_DATE: &[&str] = &["S/O Date"];
    pub const ORDER_DATE: &[&str] = &["Order Date"];
    pub const DISPATCH_DATE: &[&str] = &["Dispatch Date"];
    pub const EXPECTED_DELIVERY_DATE: &[&str] = &["Delivery Date"];
    pub const PACK_SLIP_DATE: &[&str] = &["Pack Slip Dt"];
    pub const INVOICE_DATE: &[&str] = &["Invoice Dt"];

    pub const INVOICE_NUMBER: &[&str] = &["Invoice No"];
    pub const TRUCK_NUMBER: &[&str] = &["Truck No"];
    pub const TRANSPORT: &[&str] = &["Transport"];

    pub const DEPARTMENT_REMARK: &[&str] = &["Dept.Remark"];
    pub const SO_SPECIAL_REMARK: &[&str] = &["SO SPL.Remark"];
    pub const DIE_INDENT: &[&str] = &["DIE Indend"];
}

// ==========================================
// FieldMapper - 字段映射器
// ==========================================
pub struct FieldMapper;

impl FieldMapper {
    /// 将原始行映射为标准订单记录
    ///
    /// 原始行整体以 JSON 快照保存到 raw 字段（仅审计用）。
    /// source 与 status 由后续流程填写。
    pub fn normalize(&self, row: &RawRow) -> OrderRecord {
        OrderRecord {
            // 订单标识
            po_number: self.text(row, aliases::PO_NUMBER),
            so_number: self.text(row, aliases::SO_NUMBER),
            order_number: self.text(row, aliases::ORDER_NUMBER),
            line_item_number: self.text(row, aliases::LINE_ITEM_NUMBER),

            // 产品信息
            product_code: self.text(row, aliases::PRODUCT_CODE),
            part_number: self.text(row, aliases::PART_NUMBER),
            size: self.text(row, aliases::SIZE),
            drawing_number: self.text(row, aliases::DRAWING_NUMBER),

            // 客户信息
            customer_name: self.text(row, aliases::CUSTOMER_NAME),
            customer_code: self.text(row, aliases::CUSTOMER_CODE),

            // 数量
            quantity: self.number(row, aliases::QUANTITY),
            dispatch_quantity: self.number(row, aliases::DISPATCH_QUANTITY),
            pending_quantity: self.number(row, aliases::PENDING_QUANTITY),

            // 财务
            gross_weight: self.number(row, aliases::GROSS_WEIGHT),
            charge_weight: self.number(row, aliases::CHARGE_WEIGHT),
            rate: self.number(row, aliases::RATE),

            // 日期
            so_date: self.text(row, aliases::SO_DATE),
            order_date: self.text(row, aliases::ORDER_DATE),
            dispatch_date: self.text(row, aliases::DISPATCH_DATE),
            expected_delivery_date: self.text(row, aliases::EXPECTED_DELIVERY_DATE),
            pack_slip_date: self.text(row, aliases::PACK_SLIP_DATE),
            invoice_date: self.text(row, aliases::INVOICE_DATE),

            // 发运信息
            invoice_number: self.text(row, aliases::INVOICE_NUMBER),
            truck_number: self.text(row, aliases::TRUCK_NUMBER),
            transport: self.text(row, aliases::TRANSPORT),

            // 备注
            department_remark: self.text(row, aliases::DEPARTMENT_REMARK),
            so_special_remark: self.text(row, aliases::SO_SPECIAL_REMARK),
            die_indent: self.text(row, aliases::DIE_INDENT),

            // 来源
            source: String::new(),
            raw: serde_json::to_value(row).unwrap_or(serde_json::Value::Null),

            status: None,
        }
    }

    /// 提取文本字段：按别名优先级取第一个非空值，全部缺失落空串
    fn text(&self, row: &RawRow, candidates: &[&str]) -> String {
        for alias in candidates {
            if let Some(value) = row.get(*alias) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
        String::new()
    }

    /// 提取数值字段：缺失/不可解析落 0
    fn number(&self, row: &RawRow, candidates: &[&str]) -> f64 {
        let value = self.text(row, candidates);
        if value.is_empty() {
            return 0.0;
        }
        value.parse::<f64>().unwrap_or(0.0)
    }
}
