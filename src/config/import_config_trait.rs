// ==========================================
// 产品数据导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::import_settings::ImportSettings;
use crate::importer::error::ImportResult;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader {
    /// 获取库存下限
    ///
    /// # 默认值
    /// - 10
    fn get_stock_lower_limit(&self) -> ImportResult<i64>;

    /// 获取价格下限（不含）与上限（含）
    ///
    /// # 默认值
    /// - (5, 1000)
    fn get_price_limits(&self) -> ImportResult<(rust_decimal::Decimal, rust_decimal::Decimal)>;

    /// 汇总为一次导入运行的参数
    fn load_import_settings(&self) -> ImportResult<ImportSettings>;
}
