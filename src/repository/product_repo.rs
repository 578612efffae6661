// ==========================================
// 产品数据导入 - 产品 Repository Trait
// ==========================================
// 职责: 定义导入所需的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::StoredRecord;
use crate::repository::error::RepositoryResult;

// ==========================================
// ProductStore Trait
// ==========================================
// 用途: 导入流程的存储协作方
// 实现者: ProductRepositoryImpl（使用 rusqlite）
// 约定: 同步调用，写入后本次运行内立即可见
pub trait ProductStore {
    /// 读取全部产品记录
    fn find_all(&self) -> RepositoryResult<Vec<StoredRecord>>;

    /// 按唯一 code 读取产品记录
    ///
    /// # 返回
    /// - Ok(Some(record)): 找到
    /// - Ok(None): 未找到
    fn find_by_code(&self, code: &str) -> RepositoryResult<Option<StoredRecord>>;

    /// 新增产品记录
    ///
    /// # 返回
    /// - Ok(StoredRecord): 带系统分配 id 的记录
    /// - Err(UniqueConstraintViolation): code 已存在
    fn create(&self, record: &StoredRecord) -> RepositoryResult<StoredRecord>;

    /// 按 id 原地更新产品记录（id / code / added_at 不变）
    fn update(&self, record: &StoredRecord) -> RepositoryResult<()>;

    /// 统计产品记录数
    fn count(&self) -> RepositoryResult<usize>;
}
