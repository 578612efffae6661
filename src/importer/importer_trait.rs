// ==========================================
// 产品数据导入 - 导入器 Trait
// ==========================================
// 职责: 定义导入主接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::report::ImportSummary;
use std::io::Write;

// ==========================================
// ProductImporter Trait
// ==========================================
// 实现者: ImportRunner
pub trait ProductImporter {
    /// 导入一个产品 CSV 文件
    ///
    /// # 参数
    /// - file_name: 文件名（相对 file_root）或绝对路径
    /// - out: 操作员报告输出
    ///
    /// # 返回
    /// - Ok(ImportSummary): 运行汇总（文件检查失败时 status = FileRejected）
    /// - Err: 仅当报告输出本身失败
    ///
    /// # 导入流程
    /// 1. 文件检查（存在 + .csv）
    /// 2. 一次性加载已存在记录索引
    /// 3. 逐行: 解析 → 校验 → 比对落库（预览模式跳过落库）
    /// 4. 输出运行汇总
    fn import_file<W: Write>(&self, file_name: &str, out: &mut W) -> ImportResult<ImportSummary>;
}
