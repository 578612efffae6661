// ==========================================
// 产品数据导入 - 产品领域模型
// ==========================================
// CandidateRecord: 文件行解析产物（未校验）
// NewProduct:      通过校验后的强类型产品数据
// StoredRecord:    product_data 表中的持久化记录
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 下架标记的唯一有效取值（大小写敏感）
pub const DISCONTINUED_FLAG: &str = "yes";

/// 价格落库精度（小数位）
pub const PRICE_SCALE: u32 = 2;

// ==========================================
// CandidateRecord - 导入中间结构体
// ==========================================
// 生命周期: 仅在单行处理内
// stock / price / discontinued 保留原始文本，由校验器负责类型转换
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub code: String,
    pub name: String,
    pub description: String,
    pub stock: String,
    pub price: String,
    pub discontinued: String,
    pub row_number: usize, // 文件行号（表头为第 1 行）
}

impl CandidateRecord {
    pub fn is_discontinued(&self) -> bool {
        self.discontinued == DISCONTINUED_FLAG
    }
}

// ==========================================
// NewProduct - 已校验的产品数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: String,
    pub stock: i64,
    pub price: Decimal,
    pub discontinued: bool,
}

// ==========================================
// StoredRecord - 产品主数据
// ==========================================
// 对齐: product_data 表
// 红线: code 全局唯一；discontinued_at 一旦写入不再清空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: i64,                                  // 系统分配，不可变
    pub code: String,                             // 唯一键
    pub name: String,
    pub description: String,
    pub stock: i64,
    pub price: Decimal,                           // 两位小数
    pub added_at: Option<DateTime<Utc>>,          // 仅新增时写入
    pub discontinued_at: Option<DateTime<Utc>>,   // 单向：只置位不清空
    pub updated_at: DateTime<Utc>,                // 每次写入刷新
}

impl StoredRecord {
    /// 由已校验数据构造一条待新增记录（id 由存储层分配）
    pub fn from_new(product: &NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            code: product.code.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            stock: product.stock,
            price: product.price.round_dp(PRICE_SCALE),
            added_at: Some(now),
            discontinued_at: product.discontinued.then_some(now),
            updated_at: now,
        }
    }

    /// 用已校验数据原地更新可变字段
    ///
    /// added_at 与 id 保持不变；discontinued_at 只在新标记为下架且尚未置位时写入。
    pub fn apply(&mut self, product: &NewProduct, now: DateTime<Utc>) {
        self.name = product.name.clone();
        self.description = product.description.clone();
        self.stock = product.stock;
        self.price = product.price.round_dp(PRICE_SCALE);
        if product.discontinued && self.discontinued_at.is_none() {
            self.discontinued_at = Some(now);
        }
        self.updated_at = now;
    }
}
