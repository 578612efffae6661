// ==========================================
// 产品数据导入 - 导入层
// ==========================================
// 职责: 产品 CSV 文件 → 校验 → 比对 → 落库
// 流程: 文件检查 → 行解析 → 规则校验 → 比对落库 → 运行汇总
// ==========================================

// 模块声明
pub mod error;
pub mod existing_index;
pub mod import_runner;
pub mod importer_trait;
pub mod reconciler;
pub mod record_parser;
pub mod report;
pub mod validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use existing_index::ExistingIndex;
pub use import_runner::ImportRunner;
pub use importer_trait::ProductImporter;
pub use reconciler::Reconciler;
pub use record_parser::{MalformedRow, ParsedRow, RecordParser, RowStream, PRODUCT_COLUMNS};
pub use report::{ImportSummary, RowResult, RunStatus};
pub use validator::{ValidationFailure, ValidationVerdict, Validator};
