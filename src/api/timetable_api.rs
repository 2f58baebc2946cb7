// ==========================================
// 高校排课系统 - 课表查询 API
// ==========================================
// 职责: 课表视图查询 (日/周/月/区间), 课次连带资源名称返回
// 红线: 查询即物化 — 视图返回前该区间的课次必须已入库
// ==========================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::calendar::SemesterCalendar;
use crate::domain::lesson::{LessonOccurrence, LessonPattern};
use crate::domain::types::weekday_to_db_str;
use crate::engine::materializer::MaterializerEngine;
use crate::repository::entity_repo::EntityRepository;
use crate::repository::pattern_repo::PatternRepository;

// ==========================================
// OccurrenceView - 课次视图 (连带资源名称)
// ==========================================
/// 用于展示的课次完整信息 (课次 + 教室/课程/班级/教师名称)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccurrenceView {
    pub occurrence_id: i64,
    pub pattern_id: Option<i64>,
    pub lesson_date: NaiveDate,
    pub weekday: String,
    pub period: String,
    pub room_id: i64,
    pub room_no: String,
    pub course_id: i64,
    pub course_name: String,
    pub group_id: i64,
    pub group_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
}

// ==========================================
// PatternView - 模板视图 (连带资源名称)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternView {
    pub pattern_id: i64,
    pub week_parity: String,
    pub weekday: String,
    pub period: String,
    pub room_id: i64,
    pub room_no: String,
    pub course_id: i64,
    pub course_name: String,
    pub group_id: i64,
    pub group_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
}

// ==========================================
// WeekView - 周视图 (按教学日分桶)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekView {
    pub week_no: u32,
    pub week_parity: String,
    pub monday: NaiveDate,
    pub friday: NaiveDate,
    pub days: Vec<DayBucket>,
}

/// 周视图中的单个教学日
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub weekday: String,
    pub lessons: Vec<OccurrenceView>,
}

// ==========================================
// 名称解析辅助
// ==========================================

/// 资源 id → 名称 映射 (一次装载, 避免逐行查库)
pub(crate) struct NameMaps {
    rooms: HashMap<i64, String>,
    courses: HashMap<i64, String>,
    groups: HashMap<i64, String>,
    teachers: HashMap<i64, String>,
}

impl NameMaps {
    pub(crate) fn load(entity_repo: &EntityRepository) -> ApiResult<Self> {
        Ok(Self {
            rooms: entity_repo
                .list_rooms()?
                .into_iter()
                .map(|r| (r.room_id, r.room_no))
                .collect(),
            courses: entity_repo
                .list_courses()?
                .into_iter()
                .map(|c| (c.course_id, c.course_name))
                .collect(),
            groups: entity_repo
                .list_groups()?
                .into_iter()
                .map(|g| (g.group_id, g.group_name))
                .collect(),
            teachers: entity_repo
                .list_teachers()?
                .into_iter()
                .map(|t| (t.teacher_id, t.teacher_name))
                .collect(),
        })
    }

    // 名称缺失用 "#id" 占位, 展示层不因脏数据拒绝整张课表
    pub(crate) fn room_no(&self, id: i64) -> String {
        self.rooms.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    }

    pub(crate) fn course_name(&self, id: i64) -> String {
        self.courses.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    }

    pub(crate) fn group_name(&self, id: i64) -> String {
        self.groups.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    }

    pub(crate) fn teacher_name(&self, id: i64) -> String {
        self.teachers.get(&id).cloned().unwrap_or_else(|| format!("#{}", id))
    }
}

/// 课次 → 视图
pub(crate) fn occurrence_to_view(
    occurrence: &LessonOccurrence,
    names: &NameMaps,
) -> ApiResult<OccurrenceView> {
    let occurrence_id = occurrence.occurrence_id.ok_or_else(|| {
        ApiError::InconsistentState("课次缺少 occurrence_id, 无法生成视图".to_string())
    })?;
    Ok(OccurrenceView {
        occurrence_id,
        pattern_id: occurrence.pattern_id,
        lesson_date: occurrence.lesson_date,
        weekday: weekday_to_db_str(occurrence.weekday).to_string(),
        period: occurrence.period.to_db_str().to_string(),
        room_id: occurrence.room_id,
        room_no: names.room_no(occurrence.room_id),
        course_id: occurrence.course_id,
        course_name: names.course_name(occurrence.course_id),
        group_id: occurrence.group_id,
        group_name: names.group_name(occurrence.group_id),
        teacher_id: occurrence.teacher_id,
        teacher_name: names.teacher_name(occurrence.teacher_id),
    })
}

/// 模板 → 视图
pub(crate) fn pattern_to_view(
    pattern: &LessonPattern,
    names: &NameMaps,
) -> ApiResult<PatternView> {
    let pattern_id = pattern.pattern_id.ok_or_else(|| {
        ApiError::InconsistentState("模板缺少 pattern_id, 无法生成视图".to_string())
    })?;
    Ok(PatternView {
        pattern_id,
        week_parity: pattern.week_parity.to_db_str().to_string(),
        weekday: weekday_to_db_str(pattern.weekday).to_string(),
        period: pattern.period.to_db_str().to_string(),
        room_id: pattern.room_id,
        room_no: names.room_no(pattern.room_id),
        course_id: pattern.course_id,
        course_name: names.course_name(pattern.course_id),
        group_id: pattern.group_id,
        group_name: names.group_name(pattern.group_id),
        teacher_id: pattern.teacher_id,
        teacher_name: names.teacher_name(pattern.teacher_id),
    })
}

// ==========================================
// TimetableApi - 课表查询 API
// ==========================================
#[derive(Debug)]
pub struct TimetableApi {
    calendar: SemesterCalendar,
    materializer: Arc<MaterializerEngine>,
    pattern_repo: Arc<PatternRepository>,
    entity_repo: Arc<EntityRepository>,
}

impl TimetableApi {
    /// 创建新的 TimetableApi 实例
    pub fn new(
        calendar: SemesterCalendar,
        materializer: Arc<MaterializerEngine>,
        pattern_repo: Arc<PatternRepository>,
        entity_repo: Arc<EntityRepository>,
    ) -> Self {
        Self {
            calendar,
            materializer,
            pattern_repo,
            entity_repo,
        }
    }

    /// 查询日期区间 [from, to] 的课表
    ///
    /// # 返回
    /// - Vec<OccurrenceView>: 按 (日期, 节次) 排序
    #[instrument(skip(self), fields(from = %from, to = %to))]
    pub fn occurrences_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ApiResult<Vec<OccurrenceView>> {
        if from > to {
            return Err(ApiError::InvalidRequest(format!(
                "区间起点 {} 晚于终点 {}",
                from, to
            )));
        }
        let occurrences = self.materializer.occurrences_in_range(from, to)?;
        self.to_views(&occurrences)
    }

    /// 查询单日课表
    #[instrument(skip(self), fields(date = %date))]
    pub fn day_view(&self, date: NaiveDate) -> ApiResult<Vec<OccurrenceView>> {
        let occurrences = self.materializer.occurrences_for_date(date)?;
        debug!(lessons = occurrences.len(), "日视图装配完成");
        self.to_views(&occurrences)
    }

    /// 查询教学周课表 (按教学日分桶)
    ///
    /// # 错误
    /// - InvalidRequest: 周序号超出学期范围
    #[instrument(skip(self))]
    pub fn week_view(&self, week_no: u32) -> ApiResult<WeekView> {
        if !self.calendar.contains_week(week_no) {
            return Err(ApiError::InvalidRequest(format!(
                "周序号 {} 超出学期范围 1..={}",
                week_no,
                self.calendar.week_count()
            )));
        }

        let names = NameMaps::load(&self.entity_repo)?;
        let monday = self.calendar.week_monday(week_no);
        let parity = self.calendar.week_parity_of(monday);

        let mut days = Vec::new();
        for date in self.calendar.teaching_dates_in_week(week_no) {
            let occurrences = self.materializer.occurrences_for_date(date)?;
            let mut lessons = Vec::new();
            for occurrence in &occurrences {
                lessons.push(occurrence_to_view(occurrence, &names)?);
            }
            days.push(DayBucket {
                date,
                weekday: weekday_to_db_str(date.weekday()).to_string(),
                lessons,
            });
        }

        Ok(WeekView {
            week_no,
            week_parity: parity.to_db_str().to_string(),
            monday,
            friday: self.calendar.week_friday(week_no),
            days,
        })
    }

    /// 查询月份课表 (只含学期内的教学日)
    #[instrument(skip(self))]
    pub fn month_view(&self, year: i32, month: u32) -> ApiResult<Vec<OccurrenceView>> {
        if !(1..=12).contains(&month) {
            return Err(ApiError::InvalidRequest(format!("非法月份: {}", month)));
        }
        let occurrences = self.materializer.occurrences_for_month(year, month)?;
        self.to_views(&occurrences)
    }

    /// 列出全部排课模板
    #[instrument(skip(self))]
    pub fn list_patterns(&self) -> ApiResult<Vec<PatternView>> {
        let names = NameMaps::load(&self.entity_repo)?;
        let patterns = self.pattern_repo.list_all()?;
        let mut views = Vec::new();
        for pattern in &patterns {
            views.push(pattern_to_view(pattern, &names)?);
        }
        Ok(views)
    }

    fn to_views(&self, occurrences: &[LessonOccurrence]) -> ApiResult<Vec<OccurrenceView>> {
        let names = NameMaps::load(&self.entity_repo)?;
        let mut views = Vec::new();
        for occurrence in occurrences {
            views.push(occurrence_to_view(occurrence, &names)?);
        }
        Ok(views)
    }
}
