// ==========================================
// 订单发货对账系统 - 订单导入器实现
// ==========================================
// 职责: 整合导入管道，从文件到台账
// 流程: 格式识别 → 解码 → 映射 → 标准化 → 按批落库 → 发货对账
// ==========================================
// 单次上传为单线程线性管道：解码在满批时暂停，
// 待本批写入与对账完成后恢复，内存峰值 = O(批次大小)。
// 批次严格按文件顺序提交；上一批的发货对账完成后
// 才开始下一批，避免对同一待发行读到未扣减的数量。
// ==========================================

use crate::config::IngestConfig;
use crate::domain::types::Ledger;
use crate::domain::IngestReport;
use crate::importer::batcher::RowBatcher;
use crate::importer::canonicalizer::RecordCanonicalizer;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::{FieldMapper, RawRow};
use crate::importer::file_parser::{CsvRowStream, ExcelParser, FileFormat};
use crate::importer::order_ingestor_trait::OrderIngestor;
use crate::importer::reconciler::Reconciler;
use crate::repository::LedgerRepository;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

// ==========================================
// OrderIngestorImpl - 订单导入器实现
// ==========================================
pub struct OrderIngestorImpl<R>
where
    R: LedgerRepository,
{
    // 台账仓储
    repo: R,

    // 导入配置
    config: IngestConfig,

    // 导入组件
    field_mapper: FieldMapper,
    canonicalizer: RecordCanonicalizer,
    reconciler: Reconciler,
}

impl<R> OrderIngestorImpl<R>
where
    R: LedgerRepository,
{
    /// 创建新的 OrderIngestor 实例
    pub fn new(repo: R, config: IngestConfig) -> Self {
        Self {
            repo,
            config,
            field_mapper: FieldMapper,
            canonicalizer: RecordCanonicalizer,
            reconciler: Reconciler,
        }
    }

    /// 台账仓储访问（供上层查询复用同一连接）
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// 管道主循环：逐行拉取 → 标准化 → 满批提交
    ///
    /// 解码失败或批次写入失败即中止剩余流；
    /// 已提交批次保持提交（无整文件回滚），计数保留在报告中。
    async fn run_pipeline<I>(&self, rows: I, ledger: Ledger, run_id: String) -> IngestReport
    where
        I: Iterator<Item = ImportResult<RawRow>>,
    {
        let mut report = IngestReport::new(run_id, ledger);
        let mut batcher = RowBatcher::new(self.config.batch_size);

        for next in rows {
            let row = match next {
                Ok(row) => row,
                Err(err) => {
                    error!(run_id = %report.run_id, error = %err, "行解码失败，中止导入");
                    report.aborted = Some(err.to_string());
                    break;
                }
            };

            let mut record = self.field_mapper.normalize(&row);
            record.source = self.config.source_tag.clone();
            let (record, _) = self.canonicalizer.canonicalize(record, ledger);
            batcher.push(record);

            // 回压点：满批先落库+对账，期间不拉取下一行
            if batcher.is_full() {
                if let Err(err) = self.commit_batch(&mut batcher, ledger, &mut report).await {
                    error!(
                        run_id = %report.run_id,
                        batch = report.batches + 1,
                        error = %err,
                        "批次写入失败，中止导入"
                    );
                    report.aborted = Some(err.to_string());
                    break;
                }
            }
        }

        // 尾批：输入耗尽后冲洗不足一批的剩余行
        if report.aborted.is_none() && !batcher.is_empty() {
            if let Err(err) = self.commit_batch(&mut batcher, ledger, &mut report).await {
                error!(run_id = %report.run_id, error = %err, "尾批写入失败");
                report.aborted = Some(err.to_string());
            }
        }

        report
    }

    /// 提交一个批次：写入台账，发货路径随后对账
    async fn commit_batch(
        &self,
        batcher: &mut RowBatcher,
        ledger: Ledger,
        report: &mut IngestReport,
    ) -> ImportResult<()> {
        let records = batcher.flush();

        let written = self.repo.upsert_batch(ledger, &records).await?;
        report.rows_written += written;
        report.batches += 1;

        // 对账只走发货路径，且必须在本批发货写入确认之后
        if ledger == Ledger::Dispatched {
            let stats = self.reconciler.reconcile_batch(&self.repo, &records).await;
            report.reconciled += stats.satisfied;
            report.reconcile_failed += stats.failed;
            debug!(
                run_id = %report.run_id,
                batch = report.batches,
                satisfied = stats.satisfied,
                reduced = stats.reduced,
                missed = stats.missed,
                failed = stats.failed,
                "批次对账完成"
            );
        }

        debug!(
            run_id = %report.run_id,
            batch = report.batches,
            written,
            "批次已提交"
        );

        Ok(())
    }
}

#[async_trait::async_trait]
impl<R> OrderIngestor for OrderIngestorImpl<R>
where
    R: LedgerRepository + Send + Sync,
{
    async fn ingest_file<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        ledger: Ledger,
    ) -> ImportResult<IngestReport> {
        let path = file_path.as_ref();
        let run_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        info!(
            run_id = %run_id,
            file = %path.display(),
            ledger = %ledger,
            batch_size = self.config.batch_size,
            "开始导入订单文件"
        );

        // 格式问题在任何批处理开始前拒绝
        let format = FileFormat::detect(path)?;

        let report = match format {
            FileFormat::Csv => {
                let stream = CsvRowStream::open(path)?;
                self.run_pipeline(stream, ledger, run_id).await
            }
            FileFormat::Excel => {
                // 整表载入（内存取舍见 file_parser 模块说明）
                let rows = ExcelParser.parse_to_raw_records(path)?;
                self.run_pipeline(rows.into_iter().map(Ok), ledger, run_id).await
            }
        };

        info!(
            run_id = %report.run_id,
            rows_written = report.rows_written,
            reconciled = report.reconciled,
            batches = report.batches,
            complete = report.is_complete(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "订单文件导入结束"
        );

        Ok(report)
    }

    async fn ingest_rows<I>(&self, rows: I, ledger: Ledger) -> ImportResult<IngestReport>
    where
        I: Iterator<Item = ImportResult<RawRow>> + Send,
    {
        let run_id = Uuid::new_v4().to_string();
        Ok(self.run_pipeline(rows, ledger, run_id).await)
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
        ledger: Ledger,
    ) -> ImportResult<Vec<Result<IngestReport, String>>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), ledger = %ledger, "开始批量导入文件");

        // 为每个文件创建导入任务
        let import_tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().to_str().unwrap_or("unknown").to_string();
            async move {
                match self.ingest_file(path, ledger).await {
                    Ok(report) => {
                        info!(
                            file = %path_str,
                            rows_written = report.rows_written,
                            "文件导入成功"
                        );
                        Ok(report)
                    }
                    Err(err) => {
                        error!(file = %path_str, error = %err, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, err))
                    }
                }
            }
        });

        // 并发执行所有导入任务
        let results = join_all(import_tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.is_ok()).count(),
            failed = results.iter().filter(|r| r.is_err()).count(),
            "批量导入完成"
        );

        Ok(results)
    }
}
