// ==========================================
// 产品数据导入 - 导入参数
// ==========================================
// 库存下限 / 价格区间 / 文件根目录 / 比对策略
// 默认值与历史常量一致，可由 config_kv 与命令行逐级覆写
// ==========================================

use crate::domain::ReconcilePolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 默认库存下限（含）
pub const DEFAULT_STOCK_LOWER_LIMIT: i64 = 10;

/// 默认价格下限（不含）
pub const DEFAULT_PRICE_LOWER_LIMIT: i64 = 5;

/// 默认价格上限（含）
pub const DEFAULT_PRICE_UPPER_LIMIT: i64 = 1000;

/// 默认导入文件根目录
pub const DEFAULT_FILE_ROOT: &str = "/srv/exportcsv/";

// ==========================================
// ImportSettings - 单次导入运行参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub stock_lower_limit: i64,     // stock >= 该值
    pub price_lower_limit: Decimal, // price > 该值
    pub price_upper_limit: Decimal, // price <= 该值
    pub file_root: PathBuf,
    pub policy: ReconcilePolicy,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            stock_lower_limit: DEFAULT_STOCK_LOWER_LIMIT,
            price_lower_limit: Decimal::from(DEFAULT_PRICE_LOWER_LIMIT),
            price_upper_limit: Decimal::from(DEFAULT_PRICE_UPPER_LIMIT),
            file_root: PathBuf::from(DEFAULT_FILE_ROOT),
            policy: ReconcilePolicy::default(),
        }
    }
}

impl ImportSettings {
    /// 解析导入文件路径
    ///
    /// 相对文件名拼接到 file_root 之下；绝对路径原样使用。
    pub fn resolve_file(&self, file_name: &str) -> PathBuf {
        let path = Path::new(file_name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.file_root.join(path)
        }
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }
}
