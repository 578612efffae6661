// ==========================================
// 产品数据导入 - 已存在记录索引
// ==========================================
// 运行开始时从存储层一次性加载（code → StoredRecord），运行中不再回查存储
// 本次运行接受的新 code 随即并入索引
// ==========================================

use crate::domain::StoredRecord;
use crate::repository::{ProductStore, RepositoryResult};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct ExistingIndex {
    records: HashMap<String, StoredRecord>,
    // 预览模式下通过校验、但未落库的 code
    reserved: HashSet<String>,
}

impl ExistingIndex {
    /// 从存储层加载全部记录构建索引
    pub fn build<S: ProductStore + ?Sized>(store: &S) -> RepositoryResult<Self> {
        Ok(Self::from_records(store.find_all()?))
    }

    pub fn from_records(records: impl IntoIterator<Item = StoredRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.code.clone(), record))
                .collect(),
            reserved: HashSet::new(),
        }
    }

    /// code 是否已知（库中已有 / 本次已接受 / 预览已占用）
    pub fn contains(&self, code: &str) -> bool {
        self.records.contains_key(code) || self.reserved.contains(code)
    }

    pub fn get(&self, code: &str) -> Option<&StoredRecord> {
        self.records.get(code)
    }

    /// 写入或替换一条记录
    pub fn upsert(&mut self, record: StoredRecord) {
        self.reserved.remove(&record.code);
        self.records.insert(record.code.clone(), record);
    }

    /// 预览模式：登记 code 但不产生记录
    pub fn reserve(&mut self, code: &str) {
        if !self.records.contains_key(code) {
            self.reserved.insert(code.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewProduct;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn stored(code: &str) -> StoredRecord {
        StoredRecord::from_new(
            &NewProduct {
                code: code.to_string(),
                name: "Widget".to_string(),
                description: "A fine widget".to_string(),
                stock: 50,
                price: Decimal::new(999, 2),
                discontinued: false,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_lookup_by_code() {
        let index = ExistingIndex::from_records(vec![stored("A1"), stored("B2")]);

        assert_eq!(index.len(), 2);
        assert!(index.contains("A1"));
        assert_eq!(index.get("B2").map(|r| r.code.as_str()), Some("B2"));
        assert!(!index.contains("C3"));
        assert!(index.get("C3").is_none());
    }

    #[test]
    fn test_reserve_marks_known_without_record() {
        let mut index = ExistingIndex::default();
        index.reserve("A1");

        assert!(index.contains("A1"));
        assert!(index.get("A1").is_none());
        assert!(index.is_empty());

        index.upsert(stored("A1"));
        assert_eq!(index.len(), 1);
        assert!(index.get("A1").is_some());
    }
}
