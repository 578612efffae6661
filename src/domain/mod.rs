// ==========================================
// 产品数据导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod product;
pub mod types;

// 重导出核心类型
pub use product::{CandidateRecord, NewProduct, StoredRecord, DISCONTINUED_FLAG, PRICE_SCALE};
pub use types::{ReconcilePolicy, RowOutcome, RunMode};
