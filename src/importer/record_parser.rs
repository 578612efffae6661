// ==========================================
// 产品数据导入 - 行解析器
// ==========================================
// 阶段 0: 文件检查（存在 + .csv 扩展名）
// 阶段 1: 按物理行读取，第 1 行视为表头直接丢弃（含空行）
//         引号未闭合时续读下一物理行；空行按单字段行处理
// 阶段 2: 按固定 6 列位置映射为 CandidateRecord
// ==========================================

use crate::domain::CandidateRecord;
use crate::importer::error::{ImportError, ImportResult};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// 固定列顺序；列顺序调整时只改这里
pub const PRODUCT_COLUMNS: [&str; 6] = [
    "product_code",
    "product_name",
    "product_description",
    "stock",
    "cost_in_gbp",
    "discontinued",
];

/// 唯一接受的文件扩展名（大小写敏感）
pub const CSV_EXTENSION: &str = "csv";

// ==========================================
// ParsedRow - 单行解析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRow {
    Candidate(CandidateRecord),
    Malformed(MalformedRow),
}

/// 字段数不符的行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    pub row_number: usize,
    pub field_count: usize,
    pub name: String, // 第二列（若存在），仅用于诊断输出
}

impl MalformedRow {
    pub const REASON: &'static str = "Product details are missing";
}

// ==========================================
// RecordParser
// ==========================================
pub struct RecordParser;

impl RecordParser {
    /// 文件检查：必须存在且扩展名为 csv
    pub fn check_file(path: &Path) -> ImportResult<()> {
        if !path.is_file() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(CSV_EXTENSION) => Ok(()),
            other => Err(ImportError::UnsupportedFormat(
                other.unwrap_or("").to_string(),
            )),
        }
    }

    /// 打开文件并返回行流
    pub fn open(path: &Path) -> ImportResult<RowStream<File>> {
        Self::check_file(path)?;
        let file = File::open(path)?;
        Ok(Self::from_reader(file))
    }

    /// 从任意 Read 构造行流
    pub fn from_reader<R: Read>(reader: R) -> RowStream<R> {
        RowStream {
            reader: BufReader::new(reader),
            line_number: 0,
            finished: false,
        }
    }

    /// 拆分一条逻辑行的字段
    ///
    /// 空行（或仅含空白）视为只有一个空字段，随后在位置映射阶段判为字段数不符。
    pub fn parse_line(raw: &[u8], row_number: usize) -> ImportResult<ParsedRow> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头由 RowStream 按行号丢弃，不校验内容
            .flexible(true) // 允许行长度不一致，字段数在映射阶段判定
            .trim(Trim::All)
            .from_reader(raw);

        let mut record = StringRecord::new();
        if !reader.read_record(&mut record)? {
            record = StringRecord::from(vec![""]);
        }
        Ok(Self::parse_record(&record, row_number))
    }

    /// 位置映射: 字段数必须恰好等于列数
    pub fn parse_record(record: &StringRecord, row_number: usize) -> ParsedRow {
        if record.len() != PRODUCT_COLUMNS.len() {
            return ParsedRow::Malformed(MalformedRow {
                row_number,
                field_count: record.len(),
                name: record.get(1).unwrap_or("").to_string(),
            });
        }

        let field = |idx: usize| record.get(idx).unwrap_or("").to_string();
        ParsedRow::Candidate(CandidateRecord {
            code: field(0),
            name: field(1),
            description: field(2),
            stock: field(3),
            price: field(4),
            discontinued: field(5),
            row_number,
        })
    }
}

// ==========================================
// RowStream - 前向只读行流
// ==========================================
pub struct RowStream<R: Read> {
    reader: BufReader<R>,
    line_number: usize, // 已读取的物理行数
    finished: bool,
}

impl<R: Read> RowStream<R> {
    /// 追加一个物理行（含行尾）到 buf；文件结束时返回 false
    fn read_physical_line(&mut self, buf: &mut Vec<u8>) -> std::io::Result<bool> {
        let n = self.reader.read_until(b'\n', buf)?;
        if n > 0 {
            self.line_number += 1;
        }
        Ok(n > 0)
    }

    /// 读取一条逻辑行，返回其起始物理行号
    fn read_row(&mut self) -> std::io::Result<Option<(usize, Vec<u8>)>> {
        let mut buf = Vec::new();
        if !self.read_physical_line(&mut buf)? {
            return Ok(None);
        }
        let start_line = self.line_number;

        // 引号内的换行属于字段内容
        while has_open_quote(&buf) {
            if !self.read_physical_line(&mut buf)? {
                break;
            }
        }
        Ok(Some((start_line, buf)))
    }
}

/// 引号数为奇数即存在未闭合的引号（转义引号成对出现）
fn has_open_quote(buf: &[u8]) -> bool {
    buf.iter().filter(|&&b| b == b'"').count() % 2 == 1
}

impl<R: Read> Iterator for RowStream<R> {
    type Item = ImportResult<ParsedRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            match self.read_row() {
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                // 第 1 个物理行是表头，无论内容
                Ok(Some((1, _))) => continue,
                Ok(Some((row_number, raw))) => {
                    return Some(RecordParser::parse_line(&raw, row_number));
                }
                Err(e) => {
                    // IO 错误后不再继续读取
                    self.finished = true;
                    return Some(Err(ImportError::from(e)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn parse_all(content: &str) -> Vec<ParsedRow> {
        RecordParser::from_reader(content.as_bytes())
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn test_header_always_discarded() {
        // 表头内容本身就是合法数据行，也必须丢弃
        let rows = parse_all("A1,Widget,A fine widget,50,9.99,no\nB2,Gadget,Shiny,20,15.00,yes\n");

        assert_eq!(rows.len(), 1);
        match &rows[0] {
            ParsedRow::Candidate(c) => {
                assert_eq!(c.code, "B2");
                assert_eq!(c.row_number, 2);
                assert_eq!(c.discontinued, "yes");
            }
            other => panic!("unexpected row: {:?}", other),
        }
    }

    #[test]
    fn test_positional_mapping_and_trim() {
        let rows = parse_all(
            "Product Code,Product Name,Product Description,Stock,Cost in GBP,Discontinued\n\
             A1 , Widget ,A fine widget, 50 ,9.99,no\n",
        );

        assert_eq!(
            rows,
            vec![ParsedRow::Candidate(CandidateRecord {
                code: "A1".to_string(),
                name: "Widget".to_string(),
                description: "A fine widget".to_string(),
                stock: "50".to_string(),
                price: "9.99".to_string(),
                discontinued: "no".to_string(),
                row_number: 2,
            })]
        );
    }

    #[test]
    fn test_wrong_field_count_is_malformed_and_stream_continues() {
        let rows = parse_all(
            "h1,h2,h3,h4,h5,h6\n\
             A1,Widget,A fine widget,50\n\
             A2,Gizmo,Too many,50,9.99,no,extra\n\
             A3,Gadget,Shiny,20,15.00,no\n",
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            ParsedRow::Malformed(MalformedRow {
                row_number: 2,
                field_count: 4,
                name: "Widget".to_string(),
            })
        );
        assert!(matches!(&rows[1], ParsedRow::Malformed(m) if m.field_count == 7));
        assert!(matches!(&rows[2], ParsedRow::Candidate(c) if c.code == "A3"));
    }

    #[test]
    fn test_blank_first_line_is_the_header() {
        let rows = parse_all(
            "\nA1,Widget,A fine widget,50,9.99,no\nB2,Gadget,Shiny,20,15.00,yes\n",
        );

        let codes: Vec<_> = rows
            .iter()
            .map(|r| match r {
                ParsedRow::Candidate(c) => (c.code.as_str(), c.row_number),
                other => panic!("unexpected row: {:?}", other),
            })
            .collect();
        assert_eq!(codes, vec![("A1", 2), ("B2", 3)]);
    }

    #[test]
    fn test_blank_line_inside_file_is_malformed() {
        let rows = parse_all(
            "h1,h2,h3,h4,h5,h6\n\
             A1,Widget,A fine widget,50,9.99,no\n\
             \n\
             B2,Gadget,Shiny,20,15.00,yes\n",
        );

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[1],
            ParsedRow::Malformed(MalformedRow {
                row_number: 3,
                field_count: 1,
                name: String::new(),
            })
        );
        assert!(matches!(&rows[2], ParsedRow::Candidate(c) if c.code == "B2" && c.row_number == 4));
    }

    #[test]
    fn test_quoted_newline_keeps_row_numbers_physical() {
        let rows = parse_all(
            "h\nA1,Widget,\"Line one\nline two\",50,9.99,no\nB2,Gadget,Shiny,20,15.00,no\n",
        );

        assert_eq!(rows.len(), 2);
        assert!(matches!(
            &rows[0],
            ParsedRow::Candidate(c) if c.description == "Line one\nline two" && c.row_number == 2
        ));
        assert!(matches!(&rows[1], ParsedRow::Candidate(c) if c.code == "B2" && c.row_number == 4));
    }

    #[test]
    fn test_crlf_line_endings() {
        let rows = parse_all("h\r\nA1,Widget,A fine widget,50,9.99,no\r\n");
        assert!(matches!(&rows[0], ParsedRow::Candidate(c) if c.discontinued == "no"));
    }

    #[test]
    fn test_quoted_commas_stay_in_field() {
        let rows = parse_all("h\nA1,Widget,\"Fine, sturdy widget\",50,9.99,no\n");
        assert!(
            matches!(&rows[0], ParsedRow::Candidate(c) if c.description == "Fine, sturdy widget")
        );
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(parse_all("").is_empty());
        assert!(parse_all("only,a,header\n").is_empty());
    }

    #[test]
    fn test_check_file_rejects_missing_and_wrong_extension() {
        let missing = RecordParser::check_file(Path::new("does_not_exist.csv"));
        assert!(matches!(missing, Err(ImportError::FileNotFound(_))));

        let mut txt = Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(txt, "h").unwrap();
        assert!(matches!(
            RecordParser::check_file(txt.path()),
            Err(ImportError::UnsupportedFormat(_))
        ));

        // 扩展名大小写敏感
        let upper = Builder::new().suffix(".CSV").tempfile().unwrap();
        assert!(RecordParser::check_file(upper.path()).is_err());

        let csv = Builder::new().suffix(".csv").tempfile().unwrap();
        assert!(RecordParser::check_file(csv.path()).is_ok());
    }
}
