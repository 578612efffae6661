// ==========================================
// 产品数据导入 - 配置管理器
// ==========================================
// 职责: 配置查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::import_settings::ImportSettings;
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::ReconcilePolicy;
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ImportError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取配置并按类型解析；缺省时返回 None
    fn get_parsed<T, E>(&self, key: &str) -> ImportResult<Option<T>>
    where
        T: FromStr<Err = E>,
        E: std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ImportError::ConfigValueError {
                    key: key.to_string(),
                    value: raw.clone(),
                    message: e.to_string(),
                }),
        }
    }

    /// 获取导入相关配置的快照（JSON格式），用于运行日志
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' AND key LIKE 'import.%' ORDER BY key",
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_stock_lower_limit(&self) -> ImportResult<i64> {
        Ok(self
            .get_parsed::<i64, _>(config_keys::STOCK_LOWER_LIMIT)?
            .unwrap_or_else(|| ImportSettings::default().stock_lower_limit))
    }

    fn get_price_limits(&self) -> ImportResult<(Decimal, Decimal)> {
        let defaults = ImportSettings::default();
        let lower = self
            .get_parsed::<Decimal, _>(config_keys::PRICE_LOWER_LIMIT)?
            .unwrap_or(defaults.price_lower_limit);
        let upper = self
            .get_parsed::<Decimal, _>(config_keys::PRICE_UPPER_LIMIT)?
            .unwrap_or(defaults.price_upper_limit);

        if lower >= upper {
            return Err(ImportError::ConfigValueError {
                key: config_keys::PRICE_LOWER_LIMIT.to_string(),
                value: lower.to_string(),
                message: format!("价格下限必须小于上限 {}", upper),
            });
        }
        Ok((lower, upper))
    }

    fn load_import_settings(&self) -> ImportResult<ImportSettings> {
        let defaults = ImportSettings::default();
        let (price_lower_limit, price_upper_limit) = self.get_price_limits()?;

        let file_root = self
            .get_config_value(config_keys::FILE_ROOT)?
            .map(|v| PathBuf::from(v.trim()))
            .unwrap_or(defaults.file_root);

        let policy = self
            .get_parsed::<ReconcilePolicy, _>(config_keys::POLICY)?
            .unwrap_or(defaults.policy);

        Ok(ImportSettings {
            stock_lower_limit: self.get_stock_lower_limit()?,
            price_lower_limit,
            price_upper_limit,
            file_root,
            policy,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const STOCK_LOWER_LIMIT: &str = "import.stock_lower_limit";
    pub const PRICE_LOWER_LIMIT: &str = "import.price_lower_limit";
    pub const PRICE_UPPER_LIMIT: &str = "import.price_upper_limit";
    pub const FILE_ROOT: &str = "import.file_root";
    pub const POLICY: &str = "import.policy"; // upsert / reject-duplicates
}
