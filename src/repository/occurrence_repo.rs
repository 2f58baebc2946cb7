// ==========================================
// 高校排课系统 - 课次占用数据仓储
// ==========================================
// 职责: lesson_occurrence 表的读写与按需物化
// 红线: 物化与级联平移必须在单次锁 + 单事务内完成
// 约定: 同一 (pattern_id, lesson_date) 至多物化一行
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::lesson::{LessonOccurrence, LessonPattern};
use crate::domain::types::{weekday_from_db_str, weekday_ordinal, weekday_to_db_str, Period};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::PERIOD_ORDER_SQL;
use chrono::{Duration, NaiveDate, Weekday};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const OCCURRENCE_COLUMNS: &str = "occurrence_id, pattern_id, lesson_date, weekday, period, \
     room_id, course_id, group_id, teacher_id";

// ==========================================
// OccurrenceRepository - 课次占用仓储
// ==========================================

/// 课次占用仓储
/// 职责: 已物化课次的存取, 缺失课次的补物化, 永久调课的级联平移
#[derive(Debug)]
pub struct OccurrenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OccurrenceRepository {
    /// 创建新的课次占用仓储实例
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

    /// 新增课次占用,返回自增ID
    pub fn insert(&self, occurrence: &LessonOccurrence) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO lesson_occurrence
             (pattern_id, lesson_date, weekday, period, room_id, course_id, group_id, teacher_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                occurrence.pattern_id,
                occurrence.lesson_date.format("%Y-%m-%d").to_string(),
                weekday_to_db_str(occurrence.weekday),
                occurrence.period.to_db_str(),
                occurrence.room_id,
                occurrence.course_id,
                occurrence.group_id,
                occurrence.teacher_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询课次占用
    pub fn find_by_id(&self, occurrence_id: i64) -> RepositoryResult<Option<LessonOccurrence>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM lesson_occurrence WHERE occurrence_id = ?1",
            OCCURRENCE_COLUMNS
        );
        let occurrence = conn
            .query_row(&sql, params![occurrence_id], map_occurrence_row)
            .optional()?;
        Ok(occurrence)
    }

    /// 查询某日已物化的全部课次
    ///
    /// # 返回
    /// 按节次序数、ID排序的课次列表 (仅含库中已有行, 不触发物化)
    pub fn find_materialized_by_date(
        &self,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        let conn = self.get_conn()?;
        Self::select_by_date(&conn, date)
    }

    /// 查询日期区间内已物化的全部课次 (含两端)
    pub fn find_materialized_in_range(
        &self,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM lesson_occurrence
             WHERE lesson_date >= ?1 AND lesson_date <= ?2
             ORDER BY lesson_date, {}, occurrence_id",
            OCCURRENCE_COLUMNS, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let occurrences = stmt
            .query_map(
                params![
                    from_date.format("%Y-%m-%d").to_string(),
                    to_date.format("%Y-%m-%d").to_string()
                ],
                map_occurrence_row,
            )?
            .collect::<SqliteResult<Vec<LessonOccurrence>>>()?;
        Ok(occurrences)
    }

    /// 查询某周期课位的全部已物化课次 (按日期排序)
    pub fn find_by_pattern_id(&self, pattern_id: i64) -> RepositoryResult<Vec<LessonOccurrence>> {
        let conn = self.get_conn()?;
        Self::select_by_pattern(&conn, pattern_id)
    }

    /// 补物化缺失课次
    ///
    /// 对每个给定周期课位检查 (pattern_id, date) 是否已有行,
    /// 没有才插入 `from_pattern` 投影。单次锁 + 单事务覆盖整个
    /// 读-判-写区间, 并发的重叠调用不会交错插入。
    ///
    /// # 参数
    /// * `patterns` - 当日应出勤的周期课位 (必须携带 pattern_id)
    /// * `date` - 物化目标日期
    ///
    /// # 返回
    /// 该日期的全部已物化课次 (含本次补齐的与既有的例外行)
    pub fn materialize_missing(
        &self,
        patterns: &[LessonPattern],
        date: NaiveDate,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let date_str = date.format("%Y-%m-%d").to_string();
        {
            let mut exists_stmt = tx.prepare(
                "SELECT 1 FROM lesson_occurrence
                 WHERE pattern_id = ?1 AND lesson_date = ?2
                 LIMIT 1",
            )?;
            let mut insert_stmt = tx.prepare(
                "INSERT INTO lesson_occurrence
                 (pattern_id, lesson_date, weekday, period, room_id, course_id, group_id, teacher_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for pattern in patterns {
                let pattern_id = pattern.pattern_id.ok_or_else(|| {
                    RepositoryError::InvalidInput("待物化课位缺少 pattern_id".to_string())
                })?;
                let already: Option<i64> = exists_stmt
                    .query_row(params![pattern_id, date_str], |row| row.get(0))
                    .optional()?;
                if already.is_some() {
                    continue;
                }
                let projection = LessonOccurrence::from_pattern(pattern, date);
                insert_stmt.execute(params![
                    pattern_id,
                    date_str,
                    weekday_to_db_str(projection.weekday),
                    projection.period.to_db_str(),
                    projection.room_id,
                    projection.course_id,
                    projection.group_id,
                    projection.teacher_id,
                ])?;
            }
        }
        let materialized = Self::select_by_date(&tx, date)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(materialized)
    }

    /// 更新课次占用 (按 occurrence_id 覆盖全部可变字段)
    pub fn update(&self, occurrence: &LessonOccurrence) -> RepositoryResult<()> {
        let occurrence_id = occurrence.occurrence_id.ok_or_else(|| {
            RepositoryError::InvalidInput("更新课次必须携带 occurrence_id".to_string())
        })?;
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE lesson_occurrence
             SET pattern_id = ?1, lesson_date = ?2, weekday = ?3, period = ?4,
                 room_id = ?5, course_id = ?6, group_id = ?7, teacher_id = ?8
             WHERE occurrence_id = ?9",
            params![
                occurrence.pattern_id,
                occurrence.lesson_date.format("%Y-%m-%d").to_string(),
                weekday_to_db_str(occurrence.weekday),
                occurrence.period.to_db_str(),
                occurrence.room_id,
                occurrence.course_id,
                occurrence.group_id,
                occurrence.teacher_id,
                occurrence_id,
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("LessonOccurrence", occurrence_id));
        }
        Ok(())
    }

    /// 级联平移某周期课位的全部已物化课次
    ///
    /// 永久调课时调用: 每行日期按"新星期 - 该行自身星期"的有符号天数差
    /// 在本周内平移, 星期/节次/教室覆盖为新值。单次锁 + 单事务,
    /// 任一行与唯一索引冲突则整批回滚。
    ///
    /// # 参数
    /// * `pattern_id` - 周期课位ID
    /// * `new_weekday` - 新星期
    /// * `new_period` - 新节次
    /// * `new_room_id` - 新教室
    ///
    /// # 返回
    /// 平移后的全部课次行 (重新读取, 按新日期排序)
    pub fn shift_all_for_pattern(
        &self,
        pattern_id: i64,
        new_weekday: Weekday,
        new_period: Period,
        new_room_id: i64,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        {
            let rows = Self::select_by_pattern(&tx, pattern_id)?;
            let mut update_stmt = tx.prepare(
                "UPDATE lesson_occurrence
                 SET lesson_date = ?1, weekday = ?2, period = ?3, room_id = ?4
                 WHERE occurrence_id = ?5",
            )?;
            for occurrence in rows {
                let delta_days = i64::from(weekday_ordinal(new_weekday))
                    - i64::from(weekday_ordinal(occurrence.weekday));
                let new_date = occurrence.lesson_date + Duration::days(delta_days);
                let occurrence_id = occurrence.occurrence_id.ok_or_else(|| {
                    RepositoryError::InternalError("课次行缺少 occurrence_id".to_string())
                })?;
                update_stmt.execute(params![
                    new_date.format("%Y-%m-%d").to_string(),
                    weekday_to_db_str(new_weekday),
                    new_period.to_db_str(),
                    new_room_id,
                    occurrence_id,
                ])?;
            }
        }
        let shifted = Self::select_by_pattern(&tx, pattern_id)?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(shifted)
    }

    /// 删除课次占用
    pub fn delete(&self, occurrence_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM lesson_occurrence WHERE occurrence_id = ?1",
            params![occurrence_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::not_found("LessonOccurrence", occurrence_id));
        }
        Ok(())
    }

    /// 删除某周期课位的全部已物化课次,返回删除行数
    pub fn delete_all_for_pattern(&self, pattern_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM lesson_occurrence WHERE pattern_id = ?1",
            params![pattern_id],
        )?;
        Ok(affected)
    }

    // ==========================================
    // 内部查询 (供普通连接与事务复用)
    // ==========================================

    /// 按日期读取全部课次 (节次序数、ID排序)
    fn select_by_date(
        conn: &Connection,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        let sql = format!(
            "SELECT {} FROM lesson_occurrence
             WHERE lesson_date = ?1
             ORDER BY {}, occurrence_id",
            OCCURRENCE_COLUMNS, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let occurrences = stmt
            .query_map(
                params![date.format("%Y-%m-%d").to_string()],
                map_occurrence_row,
            )?
            .collect::<SqliteResult<Vec<LessonOccurrence>>>()?;
        Ok(occurrences)
    }

    /// 按周期课位读取全部课次 (日期、节次序数排序)
    fn select_by_pattern(
        conn: &Connection,
        pattern_id: i64,
    ) -> RepositoryResult<Vec<LessonOccurrence>> {
        let sql = format!(
            "SELECT {} FROM lesson_occurrence
             WHERE pattern_id = ?1
             ORDER BY lesson_date, {}, occurrence_id",
            OCCURRENCE_COLUMNS, PERIOD_ORDER_SQL
        );
        let mut stmt = conn.prepare(&sql)?;
        let occurrences = stmt
            .query_map(params![pattern_id], map_occurrence_row)?
            .collect::<SqliteResult<Vec<LessonOccurrence>>>()?;
        Ok(occurrences)
    }
}

/// 将查询行映射为 LessonOccurrence
fn map_occurrence_row(row: &Row) -> rusqlite::Result<LessonOccurrence> {
    let date_str: String = row.get(2)?;
    let weekday_str: String = row.get(3)?;
    let period_str: String = row.get(4)?;
    Ok(LessonOccurrence {
        occurrence_id: Some(row.get(0)?),
        pattern_id: row.get(1)?,
        lesson_date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
        weekday: weekday_from_db_str(&weekday_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("无效星期: {}", weekday_str).into(),
            )
        })?,
        period: Period::from_str(&period_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                Type::Text,
                format!("无效节次: {}", period_str).into(),
            )
        })?,
        room_id: row.get(5)?,
        course_id: row.get(6)?,
        group_id: row.get(7)?,
        teacher_id: row.get(8)?,
    })
}
