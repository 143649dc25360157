// ==========================================
// 订单发货对账系统 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx/.xls)
// ==========================================
// CSV 按行惰性解码（拉取式迭代器），供导入管道按批消费，
// 内存峰值与文件大小无关。
// Excel 为整表一次性解码：电子表格格式不支持增量读行，
// 此处接受整表驻留内存的代价：发货/待发的 Excel 上传
// 比 CSV 导出小几个数量级。
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::RawRow;
use calamine::{open_workbook, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// FileFormat - 按扩展名识别的文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Excel,
}

impl FileFormat {
    /// 识别文件格式；未知扩展名在任何批处理开始前拒绝
    pub fn detect(path: &Path) -> ImportResult<FileFormat> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Excel),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

/// 列名清洗：去首尾空白并把连续空白折叠为单个空格
///
/// 源文件表头不保证干净（换行/重复空格常见）。
pub fn normalize_header(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ==========================================
// CsvRowStream - CSV 惰性行流
// ==========================================
// 实现 Iterator：只有消费方拉取时才解码下一行。
// 导入管道在批次落库期间不拉取，即为解码的暂停点。
pub struct CsvRowStream {
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<File>,
}

impl CsvRowStream {
    /// 打开 CSV 文件并读取表头
    pub fn open(path: &Path) -> ImportResult<CsvRowStream> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();

        Ok(CsvRowStream {
            headers,
            records: reader.into_records(),
        })
    }
}

impl Iterator for CsvRowStream {
    type Item = ImportResult<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) => return Some(Err(err.into())),
            };

            let mut row = RawRow::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = self.headers.get(col_idx) {
                    row.insert(header.clone(), value.trim().to_string());
                }
            }

            // 跳过完全空白的行
            if row.values().all(|v| v.is_empty()) {
                continue;
            }

            return Some(Ok(row));
        }
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 整表解析 Excel 为原始行记录
    pub fn parse_to_raw_records(&self, path: &Path) -> ImportResult<Vec<RawRow>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = pick_worksheet(&sheet_names)
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("工作表无数据行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| normalize_header(&cell.to_string()))
            .collect();

        // 读取数据行：空单元格落为空串，不落为缺失
        let mut records = Vec::new();
        for data_row in rows {
            let mut row = RawRow::new();
            for (col_idx, header) in headers.iter().enumerate() {
                let value = data_row
                    .get(col_idx)
                    .map(|cell| cell.to_string().trim().to_string())
                    .unwrap_or_default();
                row.insert(header.clone(), value);
            }

            // 跳过完全空白的行
            if row.values().all(|v| v.is_empty()) {
                continue;
            }

            records.push(row);
        }

        Ok(records)
    }
}

/// 工作表选择：优先名称含 "out" 的表（出库导出表），否则取第一个
fn pick_worksheet(sheet_names: &[String]) -> Option<String> {
    sheet_names
        .iter()
        .find(|name| name.to_lowercase().contains("out"))
        .cloned()
        .or_else(|| sheet_names.first().cloned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("  Order No  "), "Order No");
        assert_eq!(normalize_header("Order    No"), "Order No");
        assert_eq!(normalize_header("Order\nNo"), "Order No");
    }

    #[test]
    fn test_detect_format() {
        let csv = csv_file("a,b\n1,2\n");
        assert_eq!(FileFormat::detect(csv.path()).unwrap(), FileFormat::Csv);

        let missing = FileFormat::detect(Path::new("no_such_file.csv"));
        assert!(matches!(missing, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_detect_unsupported_extension() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"junk").unwrap();
        let result = FileFormat::detect(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_csv_stream_basic() {
        let file = csv_file("Order No,Sale Qty\nPO1,40\nPO2,60\n");
        let rows: Vec<RawRow> = CsvRowStream::open(file.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("Order No"), Some(&"PO1".to_string()));
        assert_eq!(rows[1].get("Sale Qty"), Some(&"60".to_string()));
    }

    #[test]
    fn test_csv_stream_normalizes_headers() {
        let file = csv_file("  Order   No ,Sale Qty\nPO1,40\n");
        let rows: Vec<RawRow> = CsvRowStream::open(file.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows[0].get("Order No"), Some(&"PO1".to_string()));
    }

    #[test]
    fn test_csv_stream_skips_blank_rows() {
        let file = csv_file("Order No,Sale Qty\nPO1,40\n,\nPO2,60\n");
        let rows: Vec<RawRow> = CsvRowStream::open(file.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_csv_stream_is_lazy() {
        // 迭代器只在拉取时消费底层 reader：取一行后停止不报错
        let file = csv_file("Order No\nPO1\nPO2\nPO3\n");
        let mut stream = CsvRowStream::open(file.path()).unwrap();
        let first = stream.next().unwrap().unwrap();
        assert_eq!(first.get("Order No"), Some(&"PO1".to_string()));
        drop(stream);
    }

    #[test]
    fn test_pick_worksheet_prefers_out() {
        let names = vec![
            "Summary".to_string(),
            "OUTSTANDING".to_string(),
            "Data".to_string(),
        ];
        assert_eq!(pick_worksheet(&names), Some("OUTSTANDING".to_string()));
    }

    #[test]
    fn test_pick_worksheet_falls_back_to_first() {
        let names = vec!["Sheet1".to_string(), "Sheet2".to_string()];
        assert_eq!(pick_worksheet(&names), Some("Sheet1".to_string()));
        assert_eq!(pick_worksheet(&[]), None);
    }

    #[test]
    fn test_excel_parser_missing_file() {
        let parser = ExcelParser;
        let result = parser.parse_to_raw_records(Path::new("no_such_file.xlsx"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }
}
