// ==========================================
// 订单发货对账系统 - 命令行入口
// ==========================================
// 用法:
//   order-ledger <db_path> <file_path> <pending|dispatched>
//
// 将订单文件导入指定台账；发货台账导入会同步扣减待发台账。
// ==========================================

use order_ledger::config::IngestConfig;
use order_ledger::domain::types::Ledger;
use order_ledger::importer::{OrderIngestor, OrderIngestorImpl};
use order_ledger::repository::LedgerRepositoryImpl;
use order_ledger::logging;

fn usage() -> ! {
    eprintln!("用法: order-ledger <db_path> <file_path> <pending|dispatched>");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", order_ledger::APP_NAME);
    tracing::info!("系统版本: {}", order_ledger::VERSION);
    tracing::info!("==================================================");

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(|| usage());
    let file_path = args.next().unwrap_or_else(|| usage());
    let ledger = args
        .next()
        .and_then(|v| Ledger::parse(&v))
        .unwrap_or_else(|| usage());

    let repo = LedgerRepositoryImpl::new(&db_path)?;
    let ingestor = OrderIngestorImpl::new(repo, IngestConfig::from_env());

    let report = ingestor.ingest_file(&file_path, ledger).await?;

    println!(
        "rows_written={} reconciled={} batches={} complete={}",
        report.rows_written,
        report.reconciled,
        report.batches,
        report.is_complete()
    );

    // 部分完成：前缀已落库，以非零码提示调用方
    if let Some(reason) = &report.aborted {
        eprintln!("导入中止: {}", reason);
        std::process::exit(1);
    }

    Ok(())
}
