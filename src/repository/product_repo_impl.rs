// ==========================================
// 产品数据导入 - 产品 Repository 实现
// ==========================================
// 职责: 实现 product_data 表的数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::StoredRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_repo::ProductStore;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = "id, code, name, description, stock, price, added_at, discontinued_at, updated_at";

// ==========================================
// ProductRepositoryImpl
// ==========================================
pub struct ProductRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ProductRepositoryImpl {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 Repository
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            ensure_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射: product_data → StoredRecord
    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            stock: row.get(4)?,
            price: row.get(5)?,
            added_at: row.get(6)?,
            discontinued_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

// price 以文本存储，时间以 RFC 3339 文本存储；先取原始列，再统一转换
struct RawRow {
    id: i64,
    code: String,
    name: String,
    description: String,
    stock: i64,
    price: String,
    added_at: Option<String>,
    discontinued_at: Option<String>,
    updated_at: String,
}

impl RawRow {
    fn into_record(self) -> RepositoryResult<StoredRecord> {
        let price = Decimal::from_str(&self.price).map_err(|e| RepositoryError::FieldValueError {
            field: "price".to_string(),
            message: format!("{} ({})", e, self.price),
        })?;

        Ok(StoredRecord {
            id: self.id,
            code: self.code,
            name: self.name,
            description: self.description,
            stock: self.stock,
            price,
            added_at: parse_optional_ts("added_at", self.added_at)?,
            discontinued_at: parse_optional_ts("discontinued_at", self.discontinued_at)?,
            updated_at: parse_ts("updated_at", &self.updated_at)?,
        })
    }
}

fn parse_ts(field: &str, raw: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("{} ({})", e, raw),
        })
}

fn parse_optional_ts(field: &str, raw: Option<String>) -> RepositoryResult<Option<DateTime<Utc>>> {
    raw.map(|v| parse_ts(field, &v)).transpose()
}

impl ProductStore for ProductRepositoryImpl {
    fn find_all(&self) -> RepositoryResult<Vec<StoredRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM product_data ORDER BY id",
            SELECT_COLUMNS
        ))?;

        let rows = stmt.query_map([], Self::map_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn find_by_code(&self, code: &str) -> RepositoryResult<Option<StoredRecord>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM product_data WHERE code = ?1", SELECT_COLUMNS),
                params![code],
                Self::map_row,
            )
            .optional()?;

        raw.map(RawRow::into_record).transpose()
    }

    fn create(&self, record: &StoredRecord) -> RepositoryResult<StoredRecord> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO product_data (
                code, name, description, stock, price,
                added_at, discontinued_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.code,
                record.name,
                record.description,
                record.stock,
                record.price.round_dp(2).to_string(),
                record.added_at.map(|t| t.to_rfc3339()),
                record.discontinued_at.map(|t| t.to_rfc3339()),
                record.updated_at.to_rfc3339(),
            ],
        )?;

        let mut created = record.clone();
        created.id = conn.last_insert_rowid();
        Ok(created)
    }

    fn update(&self, record: &StoredRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE product_data SET
                name = ?1,
                description = ?2,
                stock = ?3,
                price = ?4,
                discontinued_at = ?5,
                updated_at = ?6
            WHERE id = ?7
            "#,
            params![
                record.name,
                record.description,
                record.stock,
                record.price.round_dp(2).to_string(),
                record.discontinued_at.map(|t| t.to_rfc3339()),
                record.updated_at.to_rfc3339(),
                record.id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "product_data".to_string(),
                id: record.id.to_string(),
            });
        }
        Ok(())
    }

    fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM product_data", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
