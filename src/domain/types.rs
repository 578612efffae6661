// ==========================================
// 产品数据导入 - 领域类型定义
// ==========================================
// 比对策略 / 运行模式 / 单行处理结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 比对策略 (Reconcile Policy)
// ==========================================
// Upsert: 按 code 命中则原地更新，否则新增
// RejectDuplicates: 只新增，已知 code（库中或本次文件中出现过）一律跳过
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcilePolicy {
    #[default]
    Upsert,
    RejectDuplicates,
}

impl fmt::Display for ReconcilePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcilePolicy::Upsert => write!(f, "upsert"),
            ReconcilePolicy::RejectDuplicates => write!(f, "reject-duplicates"),
        }
    }
}

impl FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "upsert" => Ok(ReconcilePolicy::Upsert),
            "reject-duplicates" => Ok(ReconcilePolicy::RejectDuplicates),
            other => Err(format!("未知的比对策略: {}", other)),
        }
    }
}

// ==========================================
// 运行模式 (Run Mode)
// ==========================================
// DryRun: 只解析、校验、输出诊断，不写库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunMode {
    #[default]
    Live,
    DryRun,
}

impl RunMode {
    /// 模式参数取值 "test" 时为预览模式，其它取值（含缺省）均为正式模式
    pub fn from_mode_arg(mode: Option<&str>) -> Self {
        match mode {
            Some("test") => RunMode::DryRun,
            _ => RunMode::Live,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, RunMode::DryRun)
    }
}

// ==========================================
// 单行处理结果 (Row Outcome)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOutcome {
    Inserted,         // 新增记录
    Updated,          // 原地更新
    Duplicate,        // 重复 code，跳过（RejectDuplicates）
    Invalid,          // 业务规则校验失败
    Malformed,        // 字段数不符
    StorageFailed,    // 写库失败
    Previewed,        // 预览模式下通过校验
}

impl fmt::Display for RowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RowOutcome::Inserted => "INSERTED",
            RowOutcome::Updated => "UPDATED",
            RowOutcome::Duplicate => "DUPLICATE",
            RowOutcome::Invalid => "INVALID",
            RowOutcome::Malformed => "MALFORMED",
            RowOutcome::StorageFailed => "STORAGE_FAILED",
            RowOutcome::Previewed => "PREVIEWED",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_only_test_selects_dry_run() {
        assert_eq!(RunMode::from_mode_arg(Some("test")), RunMode::DryRun);
        assert_eq!(RunMode::from_mode_arg(Some("TEST")), RunMode::Live);
        assert_eq!(RunMode::from_mode_arg(Some("live")), RunMode::Live);
        assert_eq!(RunMode::from_mode_arg(None), RunMode::Live);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("upsert".parse::<ReconcilePolicy>(), Ok(ReconcilePolicy::Upsert));
        assert_eq!(
            "reject-duplicates".parse::<ReconcilePolicy>(),
            Ok(ReconcilePolicy::RejectDuplicates)
        );
        assert!("merge".parse::<ReconcilePolicy>().is_err());
    }
}
