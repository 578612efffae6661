// ==========================================
// 产品数据导入 - 运行报告
// ==========================================
// 面向操作员的逐行文本输出 + 运行汇总
// ==========================================

use crate::domain::RowOutcome;
use crate::importer::record_parser::MalformedRow;
use serde::Serialize;
use std::fmt;

pub const BANNER: [&str; 2] = ["Import Product Data", "===================="];
pub const PREVIEW_NOTICE: &str = "Runs in test mode";
pub const FILE_REJECTED: &str = "The file does not exist or invalid file type";
pub const FILE_UNOPENABLE: &str = "Unable to open the file";

/// 逐行诊断: 校验失败 / 写库失败
pub fn product_failure_line(name: &str, code: &str, reason: impl fmt::Display) -> String {
    format!(
        "Unable to parse the product: Name => {}, Code: {}, Reason: => {}",
        name, code, reason
    )
}

/// 逐行诊断: 字段数不符
pub fn malformed_line(row: &MalformedRow) -> String {
    format!(
        "Unable to parse the product: Name => {}, Reason: => {}",
        row.name,
        MalformedRow::REASON
    )
}

// ==========================================
// RunStatus - 运行终态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RunStatus {
    #[default]
    Completed,
    FileRejected, // 文件不存在或扩展名不符，未处理任何行
    Aborted,      // 文件无法打开或索引加载失败，未处理任何行
}

/// 单行处理记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowResult {
    pub row_number: usize,
    pub code: Option<String>,
    pub outcome: RowOutcome,
}

// ==========================================
// ImportSummary - 运行汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub status: RunStatus,
    pub total_rows: usize, // 不含表头
    pub inserted: usize,
    pub updated: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub malformed: usize,
    pub storage_failures: usize,
    pub previewed: usize,
    pub rows: Vec<RowResult>,
}

impl ImportSummary {
    pub fn with_status(status: RunStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn record(&mut self, row_number: usize, code: Option<&str>, outcome: RowOutcome) {
        self.total_rows += 1;
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Duplicate => self.duplicates += 1,
            RowOutcome::Invalid => self.invalid += 1,
            RowOutcome::Malformed => self.malformed += 1,
            RowOutcome::StorageFailed => self.storage_failures += 1,
            RowOutcome::Previewed => self.previewed += 1,
        }
        self.rows.push(RowResult {
            row_number,
            code: code.map(str::to_string),
            outcome,
        });
    }

    /// 成功落库（或预览通过）的行数
    pub fn accepted(&self) -> usize {
        self.inserted + self.updated + self.previewed
    }

    /// 被跳过的行数
    pub fn rejected(&self) -> usize {
        self.duplicates + self.invalid + self.malformed + self.storage_failures
    }
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} rows: {} inserted, {} updated, {} previewed, {} duplicate, {} invalid, {} malformed, {} failed to save",
            self.total_rows,
            self.inserted,
            self.updated,
            self.previewed,
            self.duplicates,
            self.invalid,
            self.malformed,
            self.storage_failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_line_format() {
        assert_eq!(
            product_failure_line("Widget", "A1", "Product code is empty"),
            "Unable to parse the product: Name => Widget, Code: A1, Reason: => Product code is empty"
        );
    }

    #[test]
    fn test_malformed_line_format() {
        let row = MalformedRow {
            row_number: 3,
            field_count: 4,
            name: "Widget".to_string(),
        };
        assert_eq!(
            malformed_line(&row),
            "Unable to parse the product: Name => Widget, Reason: => Product details are missing"
        );
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = ImportSummary::default();
        summary.record(2, Some("A1"), RowOutcome::Inserted);
        summary.record(3, Some("A1"), RowOutcome::Updated);
        summary.record(4, None, RowOutcome::Malformed);
        summary.record(5, Some("B2"), RowOutcome::Invalid);

        assert_eq!(summary.total_rows, 4);
        assert_eq!(summary.accepted(), 2);
        assert_eq!(summary.rejected(), 2);
        assert_eq!(
            summary.to_string(),
            "Processed 4 rows: 1 inserted, 1 updated, 0 previewed, 0 duplicate, 1 invalid, 1 malformed, 0 failed to save"
        );
    }
}
