// ==========================================
// HPV 疫苗接种追踪系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析（整批前完成，不与行处理交错）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::domain::row::{CellValue, RawRow};
use crate::importer::column_resolver::{columns, normalize_header};
use crate::importer::error::ImportError;
use crate::importer::report_importer_trait::FileParser;
use calamine::{Data, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

// ==========================================
// 必填表头
// ==========================================
// 任一别名命中即视为存在；缺失时按展示名报告
pub struct RequiredHeader {
    pub display_name: &'static str,
    pub aliases: &'static [&'static str],
}

pub const REQUIRED_HEADERS: &[RequiredHeader] = &[
    RequiredHeader {
        display_name: "PHC Name",
        aliases: columns::PHC_NAME,
    },
    RequiredHeader {
        display_name: "Month",
        aliases: columns::MONTH,
    },
    RequiredHeader {
        display_name: "Year",
        aliases: columns::YEAR,
    },
];


/// 校验必填表头，一次性报告全部缺失项
pub fn check_required_headers(headers: &[String]) -> Result<(), ImportError> {
    let present: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|required| {
            !required
                .aliases
                .iter()
                .any(|alias| present.contains(&normalize_header(alias)))
        })
        .map(|required| required.display_name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingHeaders(missing))
    }
}

// ==========================================
// ParsedSheet - 解析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

impl ParsedSheet {
    /// 由表头与数据行构造（跳过全空行，校验行数与必填表头）
    fn build<I>(headers: Vec<String>, data_rows: I) -> Result<Self, ImportError>
    where
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        let mut rows = Vec::new();
        for cells in data_rows {
            let row = RawRow::new(
                headers
                    .iter()
                    .zip(cells.into_iter().chain(std::iter::repeat(CellValue::Empty)))
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, value)| (header.clone(), value))
                    .collect(),
            );

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }
        check_required_headers(&headers)?;

        debug!(headers = headers.len(), rows = rows.len(), "表格解析完成");
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 消费式迭代（一次性，不可重启）
    pub fn into_rows(self) -> std::vec::IntoIter<RawRow> {
        self.rows.into_iter()
    }
}

// ==========================================
// FileFormat - 文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    pub fn from_extension(path: &Path) -> Result<Self, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// 按文件头魔数识别（ZIP → xlsx，OLE2 → xls，其他按 CSV）
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"PK\x03\x04") {
            FileFormat::Xlsx
        } else if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0]) {
            FileFormat::Xls
        } else {
            FileFormat::Csv
        }
    }
}

/// 读取文件字节（检查存在性与扩展名）
fn read_file(path: &Path, allowed: &[FileFormat]) -> Result<Vec<u8>, ImportError> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }

    let format = FileFormat::from_extension(path)?;
    if !allowed.contains(&format) {
        return Err(ImportError::UnsupportedFormat(format!("{:?}", format)));
    }

    Ok(std::fs::read(path)?)
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedSheet, ImportError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut data_rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            data_rows.push(
                record
                    .iter()
                    .map(|value| CellValue::from(value.trim()))
                    .collect::<Vec<_>>(),
            );
        }

        ParsedSheet::build(headers, data_rows)
    }

    fn parse_file(&self, path: &Path) -> Result<ParsedSheet, ImportError> {
        let bytes = read_file(path, &[FileFormat::Csv])?;
        self.parse_bytes(&bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    fn cell_to_value(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::from(s.trim()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            other => CellValue::from(other.to_string().trim()),
        }
    }

    /// 读取第一个工作表，首行作为表头
    fn read_first_sheet<RS, R>(mut workbook: R) -> Result<ParsedSheet, ImportError>
    where
        RS: Read + Seek,
        R: Reader<RS>,
        R::Error: Display,
    {
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptyFile)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let data_rows = rows.map(|row| row.iter().map(Self::cell_to_value).collect::<Vec<_>>());
        ParsedSheet::build(headers, data_rows)
    }

    fn parse_with_format(&self, bytes: &[u8], format: FileFormat) -> Result<ParsedSheet, ImportError> {
        let cursor = Cursor::new(bytes.to_vec());
        match format {
            FileFormat::Xls => {
                let workbook: Xls<_> = Xls::new(cursor)?;
                Self::read_first_sheet(workbook)
            }
            _ => {
                let workbook: Xlsx<_> = Xlsx::new(cursor)?;
                Self::read_first_sheet(workbook)
            }
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedSheet, ImportError> {
        match FileFormat::detect(bytes) {
            FileFormat::Csv => Err(ImportError::ExcelParseError(
                "not an Excel workbook".to_string(),
            )),
            format => self.parse_with_format(bytes, format),
        }
    }

    fn parse_file(&self, path: &Path) -> Result<ParsedSheet, ImportError> {
        let bytes = read_file(path, &[FileFormat::Xlsx, FileFormat::Xls])?;
        self.parse_with_format(&bytes, FileFormat::from_extension(path)?)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名/文件头自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedSheet, ImportError> {
        match FileFormat::detect(bytes) {
            FileFormat::Csv => CsvParser.parse_bytes(bytes),
            format => ExcelParser.parse_with_format(bytes, format),
        }
    }

    fn parse_file(&self, path: &Path) -> Result<ParsedSheet, ImportError> {
        match FileFormat::from_extension(path)? {
            FileFormat::Csv => CsvParser.parse_file(path),
            _ => ExcelParser.parse_file(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const VALID_CSV: &str = "PHC Name,Month,Year,Fixed Doses\n\
                             Kuje PHC,3,2024,12\n\
                             Bwari PHC,March,2024,7\n";

    #[test]
    fn test_csv_parser_valid_bytes() {
        let sheet = CsvParser.parse_bytes(VALID_CSV.as_bytes()).unwrap();

        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.headers()[0], "PHC Name");
        let rows: Vec<RawRow> = sheet.into_rows().collect();
        assert_eq!(
            rows[0].get("PHC Name"),
            Some(&CellValue::Text("Kuje PHC".to_string()))
        );
        assert_eq!(
            rows[1].get("Fixed Doses"),
            Some(&CellValue::Text("7".to_string()))
        );
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(temp_file, "{}", VALID_CSV).unwrap();

        let sheet = CsvParser.parse_file(temp_file.path()).unwrap();
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_file(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let csv = "PHC Name,Month,Year\nKuje PHC,3,2024\n,,\nBwari PHC,4,2024\n";
        let sheet = CsvParser.parse_bytes(csv.as_bytes()).unwrap();

        // 应跳过空行
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn test_csv_parser_header_only_is_empty() {
        let csv = "PHC Name,Month,Year\n";
        let result = CsvParser.parse_bytes(csv.as_bytes());
        assert!(matches!(result, Err(ImportError::EmptyFile)));

        let result = CsvParser.parse_bytes(b"");
        assert!(matches!(result, Err(ImportError::EmptyFile)));
    }

    #[test]
    fn test_csv_parser_reports_every_missing_header() {
        let csv = "Center,Fixed Doses\nKuje PHC,3\n";
        let err = CsvParser.parse_bytes(csv.as_bytes()).unwrap_err();
        match err {
            ImportError::MissingHeaders(missing) => {
                assert_eq!(missing, vec!["PHC Name", "Month", "Year"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_required_headers_case_and_whitespace_insensitive() {
        let csv = " phc name , MONTH ,year\nKuje PHC,3,2024\n";
        let sheet = CsvParser.parse_bytes(csv.as_bytes()).unwrap();
        assert_eq!(sheet.headers(), &["phc name", "MONTH", "year"]);

        let headers = vec!["P H C Name".to_string(), "Month".to_string(), "Year".to_string()];
        assert!(check_required_headers(&headers).is_ok());
    }

    #[test]
    fn test_required_headers_accept_alias() {
        let headers = vec![
            "Healthcare Center".to_string(),
            "Month".to_string(),
            "Year".to_string(),
        ];
        assert!(check_required_headers(&headers).is_ok());
    }

    #[test]
    fn test_csv_parser_strips_bom() {
        let csv = "\u{feff}PHC Name,Month,Year\nKuje PHC,3,2024\n";
        let sheet = CsvParser.parse_bytes(csv.as_bytes()).unwrap();
        assert_eq!(sheet.headers()[0], "PHC Name");
    }

    #[test]
    fn test_csv_parser_invalid_utf8() {
        let mut bytes = b"PHC Name,Month,Year\n".to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFE, b',', b'3', b',', b'1', b'\n']);
        let result = CsvParser.parse_bytes(&bytes);
        assert!(matches!(result, Err(ImportError::CsvParseError(_))));
    }

    #[test]
    fn test_excel_parser_rejects_corrupt_workbook() {
        let bytes = b"PK\x03\x04 definitely not a zip archive";
        let result = UniversalFileParser.parse_bytes(bytes);
        assert!(matches!(result, Err(ImportError::ExcelParseError(_))));
    }

    #[test]
    fn test_universal_parser_unsupported_extension() {
        let temp_file = Builder::new().suffix(".pdf").tempfile().unwrap();
        let result = UniversalFileParser.parse_file(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::detect(b"PK\x03\x04rest"), FileFormat::Xlsx);
        assert_eq!(
            FileFormat::detect(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1]),
            FileFormat::Xls
        );
        assert_eq!(FileFormat::detect(b"PHC Name,Month"), FileFormat::Csv);
    }

    #[test]
    fn test_excel_cell_conversion() {
        assert_eq!(ExcelParser::cell_to_value(&Data::Int(5)), CellValue::Number(5.0));
        assert_eq!(
            ExcelParser::cell_to_value(&Data::String("  Yes ".to_string())),
            CellValue::Text("Yes".to_string())
        );
        assert_eq!(ExcelParser::cell_to_value(&Data::Bool(true)), CellValue::Bool(true));
        assert_eq!(ExcelParser::cell_to_value(&Data::Empty), CellValue::Empty);
    }
}
