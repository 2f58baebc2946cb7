// ==========================================
// 高校排课系统 - 候选槽位数据仓储
// ==========================================
// 职责: slot_option 表的读写 (可选调课目标槽位)
// 约定: (weekday, period, room_id) 唯一
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::slot_option::SlotOption;
use crate::domain::types::{weekday_from_db_str, weekday_to_db_str, Period};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{PERIOD_ORDER_SQL, WEEKDAY_ORDER_SQL};
use chrono::Weekday;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const OPTION_COLUMNS: &str = "option_id, weekday, period, room_id";

// ==========================================
// OptionRepository - 候选槽位仓储
// ==========================================

/// 候选槽位仓储
/// 职责: 调课候选槽位目录的查询与批量播种
#[derive(Debug)]
pub struct OptionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OptionRepository {
    /// 创建新的候选槽位仓储实例
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(&db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询全部候选槽位
    ///
    /// # 返回
    /// 按星期序数、节次序数、教室排序的槽位列表
    pub fn all(&self) -> RepositoryResult<Vec<SlotOption>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM slot_option
             ORDER BY {}, {}, room_id",
            OPTION_COLUMNS, WEEKDAY_ORDER_SQL, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let options = stmt
            .query_map([], map_option_row)?
            .collect::<SqliteResult<Vec<SlotOption>>>()?;
        Ok(options)
    }

    /// 查询指定星期的候选槽位
    pub fn find_by_weekday(&self, weekday: Weekday) -> RepositoryResult<Vec<SlotOption>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM slot_option
             WHERE weekday = ?1
             ORDER BY {}, room_id",
            OPTION_COLUMNS, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let options = stmt
            .query_map(params![weekday_to_db_str(weekday)], map_option_row)?
            .collect::<SqliteResult<Vec<SlotOption>>>()?;
        Ok(options)
    }

    /// 按ID查询候选槽位
    pub fn find_by_id(&self, option_id: i64) -> RepositoryResult<Option<SlotOption>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM slot_option WHERE option_id = ?1", OPTION_COLUMNS);
        let option = conn
            .query_row(&sql, params![option_id], map_option_row)
            .optional()?;
        Ok(option)
    }

    /// 批量播种候选槽位网格
    ///
    /// 生成 教室 × 星期 × 节次 的全组合,
    /// 已存在的组合跳过 (INSERT OR IGNORE), 可重复执行。
    ///
    /// # 返回
    /// 实际插入的行数
    pub fn seed_grid(
        &self,
        room_ids: &[i64],
        weekdays: &[Weekday],
        periods: &[Period],
    ) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let mut inserted: u64 = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO slot_option (weekday, period, room_id)
                 VALUES (?1, ?2, ?3)",
            )?;
            for &room_id in room_ids {
                for &weekday in weekdays {
                    for &period in periods {
                        inserted += stmt.execute(params![
                            weekday_to_db_str(weekday),
                            period.to_db_str(),
                            room_id
                        ])? as u64;
                    }
                }
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(inserted)
    }
}

/// 将查询行映射为 SlotOption
fn map_option_row(row: &Row) -> rusqlite::Result<SlotOption> {
    let weekday_str: String = row.get(1)?;
    let period_str: String = row.get(2)?;
    Ok(SlotOption {
        option_id: row.get(0)?,
        weekday: weekday_from_db_str(&weekday_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("无效星期: {}", weekday_str).into(),
            )
        })?,
        period: Period::from_str(&period_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                format!("无效节次: {}", period_str).into(),
            )
        })?,
        room_id: row.get(3)?,
    })
}
