// ==========================================
// 订单发货对账系统 - 行批次累积器
// ==========================================
// 职责: 固定容量的行缓冲，导入管道唯一的缓冲点
// 满批后由调用方 flush 落库，落库期间不再拉取新行，
// 由此把内存峰值限定在 O(批次大小)
// ==========================================

use crate::domain::OrderRecord;

// ==========================================
// RowBatcher - 行批次累积器
// ==========================================
pub struct RowBatcher {
    buffer: Vec<OrderRecord>,
    capacity: usize,
}

impl RowBatcher {
    /// 创建批次累积器（capacity 最小为 1）
    pub fn new(capacity: usize) -> RowBatcher {
        let capacity = capacity.max(1);
        RowBatcher {
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// 追加一条记录
    pub fn push(&mut self, record: OrderRecord) {
        self.buffer.push(record);
    }

    /// 是否已满（到达批次容量）
    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    /// 取出当前批次并清空缓冲
    pub fn flush(&mut self) -> Vec<OrderRecord> {
        std::mem::take(&mut self.buffer)
    }

    /// 当前缓冲行数
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// 缓冲是否为空
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// 批次容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
