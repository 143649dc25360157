// ==========================================
// 订单发货对账系统 - 订单领域模型
// ==========================================
// 职责: 标准订单记录、自然键、对账键与导入结果
// 对齐: db.rs 双台账表结构
// ==========================================

use crate::domain::types::{Ledger, OrderStatus};
use serde::{Deserialize, Serialize};

// ==========================================
// OrderRecord - 标准订单记录
// ==========================================
// 待发/发货两个台账共用同一结构
// 文本字段缺省为空串，数量字段缺省为 0
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    // ===== 订单标识 =====
    pub po_number: String,        // 采购订单号
    pub so_number: String,        // 销售订单号
    pub order_number: String,     // 内部订单号
    pub line_item_number: String, // 行项目号（区分同一 PO+产品 的重复行）

    // ===== 产品信息 =====
    pub product_code: String,   // 产品代码
    pub part_number: String,    // 款号/零件号
    pub size: String,           // 规格
    pub drawing_number: String, // 图纸号

    // ===== 客户信息 =====
    pub customer_name: String, // 客户名称
    pub customer_code: String, // 客户代码

    // ===== 数量 =====
    pub quantity: f64,          // 原始订货数量
    pub dispatch_quantity: f64, // 本记录发货数量
    pub pending_quantity: f64,  // 未发数量

    // ===== 财务 =====
    pub gross_weight: f64,  // 毛重
    pub charge_weight: f64, // 计费重量
    pub rate: f64,          // 单价

    // ===== 日期（源格式原样保存，不做时区归一）=====
    pub so_date: String,                // 销售订单日期
    pub order_date: String,             // 下单日期
    pub dispatch_date: String,          // 发货日期
    pub expected_delivery_date: String, // 预计交货日期
    pub pack_slip_date: String,         // 装箱单日期
    pub invoice_date: String,           // 发票日期

    // ===== 发运信息 =====
    pub invoice_number: String, // 发票号
    pub truck_number: String,   // 车号
    pub transport: String,      // 承运商

    // ===== 备注 =====
    pub department_remark: String, // 部门备注
    pub so_special_remark: String, // 销售订单特殊备注
    pub die_indent: String,        // 模具标识

    // ===== 来源 =====
    pub source: String,        // 导入渠道标记
    pub raw: serde_json::Value, // 原始行快照（仅审计用，不参与匹配）

    // ===== 状态（入库前由标准化流程按目标台账设置）=====
    pub status: Option<OrderStatus>,
}

// ==========================================
// NaturalKey - 自然键
// ==========================================
// 去重/更新插入的身份单位：同键的两行是同一逻辑订单行，
// 无论同一文件上传多少次都收敛为一条存储记录。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalKey {
    pub po_number: String,
    pub product_code: String,
    pub so_number: String,
    pub size: String,
    // 行项目号非空时参与自然键
    pub line_item_number: Option<String>,
    // 发票号非空且目标为发货台账时参与自然键
    pub invoice_number: Option<String>,
}

/// natural_key 存储串的字段分隔符（不会出现在业务字段中的控制字符）
const KEY_SEPARATOR: char = '\u{1f}';

impl NaturalKey {
    /// 按目标台账从标准记录构造自然键
    pub fn for_record(record: &OrderRecord, ledger: Ledger) -> NaturalKey {
        let line_item_number = if record.line_item_number.is_empty() {
            None
        } else {
            Some(record.line_item_number.clone())
        };

        let invoice_number = if ledger == Ledger::Dispatched && !record.invoice_number.is_empty() {
            Some(record.invoice_number.clone())
        } else {
            None
        };

        NaturalKey {
            po_number: record.po_number.clone(),
            product_code: record.product_code.clone(),
            so_number: record.so_number.clone(),
            size: record.size.clone(),
            line_item_number,
            invoice_number,
        }
    }

    /// 自然键的存储串形式（natural_key 列，唯一索引）
    pub fn storage_key(&self) -> String {
        let mut parts = vec![
            self.po_number.as_str(),
            self.product_code.as_str(),
            self.so_number.as_str(),
            self.size.as_str(),
        ];
        if let Some(line) = &self.line_item_number {
            parts.push(line.as_str());
        }
        if let Some(invoice) = &self.invoice_number {
            parts.push(invoice.as_str());
        }

        let mut key = String::new();
        for (idx, part) in parts.iter().enumerate() {
            if idx > 0 {
                key.push(KEY_SEPARATOR);
            }
            key.push_str(part);
        }
        key
    }
}

// ==========================================
// PendingMatchKey - 发货对账匹配键
// ==========================================
// 刻意比自然键更宽松：同一待发行可能被多条行项目号/
// 发票号不同的发货记录分批履约，因此只按 PO+产品+规格匹配。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingMatchKey {
    pub po_number: String,
    pub product_code: String,
    pub size: String,
}

impl PendingMatchKey {
    /// 从标准记录构造对账匹配键
    pub fn for_record(record: &OrderRecord) -> PendingMatchKey {
        PendingMatchKey {
            po_number: record.po_number.clone(),
            product_code: record.product_code.clone(),
            size: record.size.clone(),
        }
    }
}

// ==========================================
// ReconcileOutcome - 单条对账结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReconcileOutcome {
    /// 无匹配待发行（该发货行未被跟踪为待发，正常跳过）
    NoMatch,
    /// 扣减后仍有剩余，待发行已更新
    Reduced { remaining: f64 },
    /// 扣减后 <= 0，待发行已删除（完全履约）
    Satisfied,
}

// ==========================================
// ReconcileStats - 批次对账统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub satisfied: usize, // 完全履约（待发行被删除）
    pub reduced: usize,   // 部分履约（待发数量被扣减）
    pub missed: usize,    // 无匹配待发行
    pub failed: usize,    // 单条对账失败（不阻断批内其余记录）
}

impl ReconcileStats {
    /// 合并另一批次的统计
    pub fn merge(&mut self, other: ReconcileStats) {
        self.satisfied += other.satisfied;
        self.reduced += other.reduced;
        self.missed += other.missed;
        self.failed += other.failed;
    }
}

// ==========================================
// IngestReport - 导入结果
// ==========================================
// 部分完成的导入同样返回已提交批次的计数：
// aborted 非空时表示文件前缀已落库、后续行未处理。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub run_id: String,          // 本次导入运行 ID
    pub ledger: Ledger,          // 目标台账
    pub rows_written: usize,     // 已写入行数
    pub reconciled: usize,       // 完全履约的待发行数（发货路径）
    pub reconcile_failed: usize, // 对账失败行数（发货路径）
    pub batches: usize,          // 已提交批次数
    pub aborted: Option<String>, // 中止原因（解码/批次写入失败）
}

impl IngestReport {
    pub fn new(run_id: String, ledger: Ledger) -> IngestReport {
        IngestReport {
            run_id,
            ledger,
            rows_written: 0,
            reconciled: 0,
            reconcile_failed: 0,
            batches: 0,
            aborted: None,
        }
    }

    /// 导入是否完整跑完（无中止）
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}
