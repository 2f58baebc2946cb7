// ==========================================
// 高校排课系统 - 周期课位数据仓储
// ==========================================
// 职责: lesson_pattern 表的读写 (周期规则本体)
// 红线: Repository 不做冲突判定, 仅负责存取
// 约定: 星期/节次/单双周在库中以文本编码存储
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::lesson::LessonPattern;
use crate::domain::types::{weekday_from_db_str, weekday_to_db_str, Period, WeekParity};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{PARITY_ORDER_SQL, PERIOD_ORDER_SQL, WEEKDAY_ORDER_SQL};
use chrono::Weekday;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const PATTERN_COLUMNS: &str =
    "pattern_id, week_parity, weekday, period, room_id, course_id, group_id, teacher_id";

// ==========================================
// PatternRepository - 周期课位仓储
// ==========================================

/// 周期课位仓储
/// 职责: 周期规则的增删改查, 调课永久生效时的槽位/周型更新
#[derive(Debug)]
pub struct PatternRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PatternRepository {
    /// 创建新的周期课位仓储实例
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

    /// 新增周期课位,返回自增ID
    ///
    /// # 参数
    /// * `pattern` - 待保存的周期课位 (pattern_id 字段被忽略)
    pub fn insert(&self, pattern: &LessonPattern) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO lesson_pattern
             (week_parity, weekday, period, room_id, course_id, group_id, teacher_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                pattern.week_parity.to_db_str(),
                weekday_to_db_str(pattern.weekday),
                pattern.period.to_db_str(),
                pattern.room_id,
                pattern.course_id,
                pattern.group_id,
                pattern.teacher_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询周期课位
    pub fn find_by_id(&self, pattern_id: i64) -> RepositoryResult<Option<LessonPattern>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM lesson_pattern WHERE pattern_id = ?1",
            PATTERN_COLUMNS
        );
        let pattern = conn
            .query_row(&sql, params![pattern_id], map_pattern_row)
            .optional()?;
        Ok(pattern)
    }

    /// 查询指定周型+星期的周期课位
    ///
    /// # 参数
    /// * `parity` - 单双周型
    /// * `weekday` - 星期几
    ///
    /// # 返回
    /// 按节次序数、ID排序的课位列表
    pub fn find_for_weekday(
        &self,
        parity: WeekParity,
        weekday: Weekday,
    ) -> RepositoryResult<Vec<LessonPattern>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM lesson_pattern
             WHERE week_parity = ?1 AND weekday = ?2
             ORDER BY {}, pattern_id",
            PATTERN_COLUMNS, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let patterns = stmt
            .query_map(
                params![parity.to_db_str(), weekday_to_db_str(weekday)],
                map_pattern_row,
            )?
            .collect::<SqliteResult<Vec<LessonPattern>>>()?;
        Ok(patterns)
    }

    /// 查询指定周型的全部周期课位 (覆盖周一到周五)
    pub fn find_for_week(&self, parity: WeekParity) -> RepositoryResult<Vec<LessonPattern>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM lesson_pattern
             WHERE week_parity = ?1
             ORDER BY {}, {}, pattern_id",
            PATTERN_COLUMNS, WEEKDAY_ORDER_SQL, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let patterns = stmt
            .query_map(params![parity.to_db_str()], map_pattern_row)?
            .collect::<SqliteResult<Vec<LessonPattern>>>()?;
        Ok(patterns)
    }

    /// 查询全部周期课位
    pub fn list_all(&self) -> RepositoryResult<Vec<LessonPattern>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM lesson_pattern
             ORDER BY {}, {}, {}, pattern_id",
            PATTERN_COLUMNS, PARITY_ORDER_SQL, WEEKDAY_ORDER_SQL, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let patterns = stmt
            .query_map([], map_pattern_row)?
            .collect::<SqliteResult<Vec<LessonPattern>>>()?;
        Ok(patterns)
    }

    /// 更新周期课位的槽位 (星期/节次/教室)
    ///
    /// # 规则
    /// - 仅改动槽位三要素, 周型与课程归属不变
    /// - 课位不存在时返回 NotFound
    pub fn update_slot(
        &self,
        pattern_id: i64,
        weekday: Weekday,
        period: Period,
        room_id: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE lesson_pattern
             SET weekday = ?1, period = ?2, room_id = ?3
             WHERE pattern_id = ?4",
            params![
                weekday_to_db_str(weekday),
                period.to_db_str(),
                room_id,
                pattern_id
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("LessonPattern", pattern_id));
        }
        Ok(())
    }

    /// 更新周期课位的周型 (单周/双周)
    pub fn update_parity(&self, pattern_id: i64, parity: WeekParity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE lesson_pattern SET week_parity = ?1 WHERE pattern_id = ?2",
            params![parity.to_db_str(), pattern_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("LessonPattern", pattern_id));
        }
        Ok(())
    }

    /// 删除周期课位
    pub fn delete(&self, pattern_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM lesson_pattern WHERE pattern_id = ?1",
            params![pattern_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("LessonPattern", pattern_id));
        }
        Ok(())
    }
}

/// 将查询行映射为 LessonPattern
fn map_pattern_row(row: &Row) -> rusqlite::Result<LessonPattern> {
    let parity_str: String = row.get(1)?;
    let weekday_str: String = row.get(2)?;
    let period_str: String = row.get(3)?;
    Ok(LessonPattern {
        pattern_id: Some(row.get(0)?),
        week_parity: WeekParity::from_str(&parity_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                Type::Text,
                format!("无效周型: {}", parity_str).into(),
            )
        })?,
        weekday: weekday_from_db_str(&weekday_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                format!("无效星期: {}", weekday_str).into(),
            )
        })?,
        period: Period::from_str(&period_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("无效节次: {}", period_str).into(),
            )
        })?,
        room_id: row.get(4)?,
        course_id: row.get(5)?,
        group_id: row.get(6)?,
        teacher_id: row.get(7)?,
    })
}
