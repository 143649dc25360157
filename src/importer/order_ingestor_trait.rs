// ==========================================
// 订单发货对账系统 - 订单导入 Trait
// ==========================================
// 职责: 定义订单文件导入接口（不包含实现）
// 这是 HTTP/CLI 层依赖的唯一导入契约
// ==========================================

use crate::domain::types::Ledger;
use crate::domain::IngestReport;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::RawRow;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// OrderIngestor Trait
// ==========================================
// 用途: 订单文件导入主接口
// 实现者: OrderIngestorImpl
#[async_trait]
pub trait OrderIngestor: Send + Sync {
    /// 导入单个订单文件到指定台账
    ///
    /// # 参数
    /// - file_path: 文件路径（.csv/.xlsx/.xls）
    /// - ledger: 目标台账（待发 / 发货）
    ///
    /// # 返回
    /// - Ok(IngestReport): 导入结果。部分完成的导入同样返回：
    ///   aborted 非空表示文件前缀已落库、后续行未处理，
    ///   计数只覆盖已提交批次
    /// - Err: 文件不存在 / 格式不支持 / 表头解析失败
    ///   （均在任何批处理开始前拒绝）
    ///
    /// # 导入流程
    /// 1. 格式识别（CSV 惰性行流 / Excel 整表解码）
    /// 2. 字段映射 + 记录标准化（逐行）
    /// 3. 按批落库（满批暂停解码，落库+对账后恢复）
    /// 4. 发货路径逐条对账扣减待发台账
    /// 5. 尾批冲洗
    async fn ingest_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        ledger: Ledger,
    ) -> ImportResult<IngestReport>;

    /// 导入已解码的原始行序列
    ///
    /// 上游已完成文件解码时使用（行序列可为惰性迭代器，
    /// 批处理中的拉取节奏即为解码回压）。
    async fn ingest_rows<I>(&self, rows: I, ledger: Ledger) -> ImportResult<IngestReport>
    where
        I: Iterator<Item = ImportResult<RawRow>> + Send;

    /// 批量导入多个文件（并发执行）
    ///
    /// # 说明
    /// - 每个文件的导入相互独立，单个文件失败不影响其他文件
    ///
    /// # 返回
    /// - Ok(Vec<...>): 每个文件的导入结果或错误描述
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
        ledger: Ledger,
    ) -> ImportResult<Vec<Result<IngestReport, String>>>;
}
