// ==========================================
// 产品数据导入 - 比对落库
// ==========================================
// Upsert:           命中 code → 原地更新；未命中 → 新增
// RejectDuplicates: 已知 code → 跳过；否则新增（从不更新）
// 每条记录单独写入，不做批量事务
// ==========================================

use crate::domain::{NewProduct, ReconcilePolicy, RowOutcome, StoredRecord};
use crate::importer::existing_index::ExistingIndex;
use crate::repository::{ProductStore, RepositoryResult};
use chrono::{DateTime, Utc};
use tracing::debug;

pub struct Reconciler<'s, S: ProductStore + ?Sized> {
    store: &'s S,
    policy: ReconcilePolicy,
}

impl<'s, S: ProductStore + ?Sized> Reconciler<'s, S> {
    pub fn new(store: &'s S, policy: ReconcilePolicy) -> Self {
        Self { store, policy }
    }

    /// 对一条已校验数据执行比对并写入存储
    ///
    /// 存储写入成功后才更新索引；写入失败时索引保持不变。
    pub fn reconcile(
        &self,
        product: &NewProduct,
        index: &mut ExistingIndex,
        now: DateTime<Utc>,
    ) -> RepositoryResult<RowOutcome> {
        match self.policy {
            ReconcilePolicy::Upsert => match index.get(&product.code).cloned() {
                Some(mut updated) => {
                    updated.apply(product, now);
                    self.store.update(&updated)?;
                    debug!(code = %product.code, id = updated.id, "产品记录已更新");
                    index.upsert(updated);
                    Ok(RowOutcome::Updated)
                }
                None => self.insert(product, index, now),
            },
            ReconcilePolicy::RejectDuplicates => {
                if index.contains(&product.code) {
                    debug!(code = %product.code, "重复 code，跳过");
                    return Ok(RowOutcome::Duplicate);
                }
                self.insert(product, index, now)
            }
        }
    }

    /// 预览模式：不写存储，仅按策略登记 code
    pub fn preview(&self, product: &NewProduct, index: &mut ExistingIndex) -> RowOutcome {
        if self.policy == ReconcilePolicy::RejectDuplicates {
            index.reserve(&product.code);
        }
        RowOutcome::Previewed
    }

    fn insert(
        &self,
        product: &NewProduct,
        index: &mut ExistingIndex,
        now: DateTime<Utc>,
    ) -> RepositoryResult<RowOutcome> {
        let created = self.store.create(&StoredRecord::from_new(product, now))?;
        debug!(code = %created.code, id = created.id, "产品记录已新增");
        index.upsert(created);
        Ok(RowOutcome::Inserted)
    }
}
