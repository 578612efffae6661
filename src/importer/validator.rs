// ==========================================
// 产品数据导入 - 业务规则校验器
// ==========================================
// 规则逐条独立执行，不短路；每条失败追加一条原因
// 重复 code 校验只在 RejectDuplicates 策略下启用（传入已知 code 索引）
// ==========================================

use crate::config::ImportSettings;
use crate::domain::{CandidateRecord, NewProduct, PRICE_SCALE};
use crate::importer::existing_index::ExistingIndex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

// ==========================================
// ValidationFailure - 单条规则失败
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationFailure {
    DuplicateCode,
    CodeEmpty,
    NameEmpty,
    DescriptionEmpty,
    Stock { lower_limit: i64 },
    Price { lower_limit: Decimal, upper_limit: Decimal },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::DuplicateCode => write!(f, "Duplicate product code"),
            ValidationFailure::CodeEmpty => write!(f, "Product code is empty"),
            ValidationFailure::NameEmpty => write!(f, "Product name is empty"),
            ValidationFailure::DescriptionEmpty => write!(f, "Product description is empty"),
            ValidationFailure::Stock { lower_limit } => write!(
                f,
                "Stock may be empty, invalid or less than {}",
                lower_limit
            ),
            ValidationFailure::Price {
                lower_limit,
                upper_limit,
            } => write!(
                f,
                "Price may be empty, invalid, less than £{} or greater than £{}",
                lower_limit, upper_limit
            ),
        }
    }
}

// ==========================================
// ValidationVerdict - 校验结论
// ==========================================
// failures 为空 ⇔ 通过；通过时附带强类型产品数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub candidate: CandidateRecord,
    pub failures: Vec<ValidationFailure>,
    product: Option<NewProduct>,
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_duplicate(&self) -> bool {
        self.failures.contains(&ValidationFailure::DuplicateCode)
    }

    pub fn product(&self) -> Option<&NewProduct> {
        self.product.as_ref()
    }

    pub fn into_product(self) -> Option<NewProduct> {
        self.product
    }
}

// ==========================================
// Validator
// ==========================================
pub struct Validator {
    stock_lower_limit: i64,
    price_lower_limit: Decimal,
    price_upper_limit: Decimal,
}

impl Validator {
    pub fn new(settings: &ImportSettings) -> Self {
        Self {
            stock_lower_limit: settings.stock_lower_limit,
            price_lower_limit: settings.price_lower_limit,
            price_upper_limit: settings.price_upper_limit,
        }
    }

    /// 校验一条候选记录
    ///
    /// # 参数
    /// - candidate: 行解析产物
    /// - known_codes: 仅 RejectDuplicates 策略传入；Upsert 策略传 None
    pub fn validate(
        &self,
        candidate: CandidateRecord,
        known_codes: Option<&ExistingIndex>,
    ) -> ValidationVerdict {
        let mut failures = Vec::new();

        if let Some(index) = known_codes {
            if index.contains(&candidate.code) {
                failures.push(ValidationFailure::DuplicateCode);
            }
        }

        if candidate.code.is_empty() {
            failures.push(ValidationFailure::CodeEmpty);
        }
        if candidate.name.is_empty() {
            failures.push(ValidationFailure::NameEmpty);
        }
        if candidate.description.is_empty() {
            failures.push(ValidationFailure::DescriptionEmpty);
        }

        let stock = self.check_stock(&candidate.stock);
        if stock.is_none() {
            failures.push(ValidationFailure::Stock {
                lower_limit: self.stock_lower_limit,
            });
        }

        let price = self.check_price(&candidate.price);
        if price.is_none() {
            failures.push(ValidationFailure::Price {
                lower_limit: self.price_lower_limit,
                upper_limit: self.price_upper_limit,
            });
        }

        let product = match (failures.is_empty(), stock, price) {
            (true, Some(stock), Some(price)) => Some(NewProduct {
                code: candidate.code.clone(),
                name: candidate.name.clone(),
                description: candidate.description.clone(),
                stock,
                price,
                discontinued: candidate.is_discontinued(),
            }),
            _ => None,
        };

        ValidationVerdict {
            candidate,
            failures,
            product,
        }
    }

    /// stock: 整数且 >= 下限
    fn check_stock(&self, raw: &str) -> Option<i64> {
        raw.parse::<i64>()
            .ok()
            .filter(|stock| *stock >= self.stock_lower_limit)
    }

    /// price: 小数且 下限 < price <= 上限
    ///
    /// 按落库精度（两位小数）取整后再比较，保证存储值同样满足区间。
    fn check_price(&self, raw: &str) -> Option<Decimal> {
        Decimal::from_str(raw)
            .ok()
            .map(|price| price.round_dp(PRICE_SCALE))
            .filter(|price| *price > self.price_lower_limit && *price <= self.price_upper_limit)
    }
}
