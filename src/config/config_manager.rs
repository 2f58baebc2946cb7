// ==========================================
// 高校排课系统 - 配置管理器
// ==========================================
// 职责: 学期边界与调课校验模式的加载、查询、写入
// 存储: config_kv 表 (key-value + scope, 本系统只用 global)
// 红线: 学期边界没有隐式默认值 — 未配置就报 MissingKey,
//       绝不静默用"本学年"之类的猜测顶上
// ==========================================

use crate::api::validator::ValidationMode;
use crate::db::open_sqlite_connection;
use crate::domain::calendar::SemesterCalendar;
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置缺失: {0}")]
    MissingKey(String),

    #[error("配置值非法: {key} = {value} ({message})")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置存储失败: {0}")]
    Storage(String),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Storage(err.to_string())
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug)]
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA (幂等)。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Storage(format!("锁获取失败: {}", e)))
    }

    // ===== 基础读写 =====

    /// 读取配置值 (scope='global')
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_string(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let result = conn.query_row(
            "SELECT config_value FROM config_kv WHERE scope = 'global' AND config_key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入配置值 (UPSERT, scope='global')
    pub fn set_string(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        conn.execute(
            "INSERT INTO config_kv (scope, config_key, config_value, updated_at)
             VALUES ('global', ?1, ?2, ?3)
             ON CONFLICT(scope, config_key) DO UPDATE SET config_value = ?2, updated_at = ?3",
            params![key, value, now],
        )?;
        Ok(())
    }

    /// 读取配置值,带默认值
    fn get_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_string(key)?.unwrap_or_else(|| default.to_string()))
    }

    // ===== 类型化读写 =====

    /// 读取 ISO 日期配置 (YYYY-MM-DD)
    pub fn get_date(&self, key: &str) -> ConfigResult<Option<NaiveDate>> {
        match self.get_string(key)? {
            None => Ok(None),
            Some(value) => {
                let date = NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|e| {
                    ConfigError::InvalidValue {
                        key: key.to_string(),
                        value,
                        message: format!("无法解析为日期: {}", e),
                    }
                })?;
                Ok(Some(date))
            }
        }
    }

    /// 写入 ISO 日期配置
    pub fn set_date(&self, key: &str, date: NaiveDate) -> ConfigResult<()> {
        self.set_string(key, &date.format("%Y-%m-%d").to_string())
    }

    /// 读取调课校验模式 (默认 STRICT)
    pub fn get_validation_mode(&self) -> ConfigResult<ValidationMode> {
        let value = self.get_or_default(config_keys::VALIDATION_MODE, "STRICT")?;
        ValidationMode::from_str(&value).ok_or_else(|| ConfigError::InvalidValue {
            key: config_keys::VALIDATION_MODE.to_string(),
            value,
            message: "取值只能是 STRICT 或 LENIENT".to_string(),
        })
    }

    /// 写入调课校验模式
    pub fn set_validation_mode(&self, mode: ValidationMode) -> ConfigResult<()> {
        self.set_string(config_keys::VALIDATION_MODE, mode.as_str())
    }

    // ===== 学期日历 =====

    /// 装配学期日历
    ///
    /// # 错误
    /// - MissingKey: 起止日期任一未配置 (学期边界无隐式默认)
    /// - InvalidValue: 日期无法解析,或开学日晚于结束日
    pub fn get_semester_calendar(&self) -> ConfigResult<SemesterCalendar> {
        let start = self
            .get_date(config_keys::SEMESTER_START_DATE)?
            .ok_or_else(|| ConfigError::MissingKey(config_keys::SEMESTER_START_DATE.to_string()))?;
        let end = self
            .get_date(config_keys::SEMESTER_END_DATE)?
            .ok_or_else(|| ConfigError::MissingKey(config_keys::SEMESTER_END_DATE.to_string()))?;
        SemesterCalendar::new(start, end).map_err(|e| ConfigError::InvalidValue {
            key: config_keys::SEMESTER_START_DATE.to_string(),
            value: start.format("%Y-%m-%d").to_string(),
            message: e.to_string(),
        })
    }

    /// 原子写入学期起止日期 (两个键在同一事务内落库)
    ///
    /// # 错误
    /// - InvalidValue: 起止日期无法构成合法学期
    pub fn set_semester(&self, start: NaiveDate, end: NaiveDate) -> ConfigResult<()> {
        // 先校验再落库,半套学期边界比没有更糟
        SemesterCalendar::new(start, end).map_err(|e| ConfigError::InvalidValue {
            key: config_keys::SEMESTER_START_DATE.to_string(),
            value: start.format("%Y-%m-%d").to_string(),
            message: e.to_string(),
        })?;

        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| ConfigError::Storage(e.to_string()))?;
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        for (key, date) in [
            (config_keys::SEMESTER_START_DATE, start),
            (config_keys::SEMESTER_END_DATE, end),
        ] {
            tx.execute(
                "INSERT INTO config_kv (scope, config_key, config_value, updated_at)
                 VALUES ('global', ?1, ?2, ?3)
                 ON CONFLICT(scope, config_key) DO UPDATE SET config_value = ?2, updated_at = ?3",
                params![key, date.format("%Y-%m-%d").to_string(), now],
            )?;
        }
        tx.commit().map_err(|e| ConfigError::Storage(e.to_string()))?;
        Ok(())
    }

    // ===== 维护操作 =====

    /// 列出全部配置项 (按键排序)
    pub fn list_all(&self) -> ConfigResult<Vec<(String, String)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT config_key, config_value FROM config_kv
             WHERE scope = 'global' ORDER BY config_key",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    /// 删除配置项
    ///
    /// # 返回
    /// - true: 删除了一条配置
    /// - false: 配置原本就不存在
    pub fn delete(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope = 'global' AND config_key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 学期边界 (必配, 无默认)
    pub const SEMESTER_START_DATE: &str = "semester.start_date";
    pub const SEMESTER_END_DATE: &str = "semester.end_date";

    // 调课校验模式 (STRICT | LENIENT, 默认 STRICT)
    pub const VALIDATION_MODE: &str = "reschedule.validation_mode";
}
