// ==========================================
// 产品数据导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + CSV
// 系统定位: 固定六列产品文件的校验、比对与落库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 解析 / 校验 / 比对 / 编排
pub mod importer;

// 配置层 - 导入参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{ConfigManager, ImportConfigReader, ImportSettings};
pub use domain::{CandidateRecord, NewProduct, ReconcilePolicy, RowOutcome, RunMode, StoredRecord};
pub use importer::{ImportError, ImportResult, ImportRunner, ImportSummary, ProductImporter, RunStatus};
pub use repository::{ProductRepositoryImpl, ProductStore, RepositoryError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "产品数据导入";

// 数据库文件路径环境变量
pub const DB_PATH_ENV: &str = "PRODUCT_IMPORT_DB_PATH";

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PRODUCT_IMPORT_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./product_import.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("product-import");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("product_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
