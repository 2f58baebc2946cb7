// ==========================================
// 高校排课系统 - 课次物化引擎
// ==========================================
// 职责: 把周期模板按需投影为具体日期的课次 (读时惰性物化)
// 红线: 物化必须幂等 — 重复查询同一区间不得新增行, 行 id 保持稳定
// 红线: 缺口检测按 (模板, 日期) 粒度 — 单次调走的课次腾出的
//       原日期要能重新物化, 其他模板的例外行不得抑制它
// ==========================================

use crate::domain::calendar::SemesterCalendar;
use crate::domain::lesson::LessonOccurrence;
use crate::engine::error::EngineResult;
use crate::repository::occurrence_repo::OccurrenceRepository;
use crate::repository::pattern_repo::PatternRepository;
use chrono::{Datelike, Duration, NaiveDate};
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// MaterializerEngine - 课次物化引擎
// ==========================================
#[derive(Debug)]
pub struct MaterializerEngine {
    calendar: SemesterCalendar,
    pattern_repo: Arc<PatternRepository>,
    occurrence_repo: Arc<OccurrenceRepository>,
}

impl MaterializerEngine {
    /// 创建新的 MaterializerEngine 实例
    ///
    /// # 参数
    /// - calendar: 学期日历 (决定日期归属与周奇偶)
    /// - pattern_repo: 模板仓储
    /// - occurrence_repo: 课次仓储
    pub fn new(
        calendar: SemesterCalendar,
        pattern_repo: Arc<PatternRepository>,
        occurrence_repo: Arc<OccurrenceRepository>,
    ) -> Self {
        Self {
            calendar,
            pattern_repo,
            occurrence_repo,
        }
    }

    /// 物化并返回指定日期的全部课次
    ///
    /// # 规则
    /// - 非教学日 (周末/学期外) 直接返回空列表, 不触库
    /// - 先按 (周奇偶, 星期) 查当日应出现的模板, 再补齐缺口
    /// - 返回当日已入库的全部课次 (新生成的和例外行一并在内), 按节次排序
    ///
    /// # 返回
    /// - Vec<LessonOccurrence>: 该日期的完整课表
    #[instrument(skip(self), fields(date = %date))]
    pub fn occurrences_for_date(&self, date: NaiveDate) -> EngineResult<Vec<LessonOccurrence>> {
        // === 步骤 1: 日期归属检查 ===
        if !self.calendar.is_semester_date(date) {
            return Ok(Vec::new());
        }

        // === 步骤 2: 查当日应出现的模板 ===
        let parity = self.calendar.week_parity_of(date);
        let patterns = self.pattern_repo.find_for_weekday(parity, date.weekday())?;

        // === 步骤 3: 补齐缺口并读回当日全量 ===
        let occurrences = self.occurrence_repo.materialize_missing(&patterns, date)?;
        debug!(
            date = %date,
            patterns = patterns.len(),
            occurrences = occurrences.len(),
            "当日课次物化完成"
        );
        Ok(occurrences)
    }

    /// 物化并返回日期区间 [from, to] 的全部课次
    ///
    /// # 规则
    /// - from > to 视为空区间, 返回空列表
    /// - 逐日物化, 区间外/非教学日自然跳过
    /// - 输出按 (日期, 节次) 排序
    pub fn occurrences_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<LessonOccurrence>> {
        let mut result = Vec::new();
        let mut date = from;
        while date <= to {
            result.extend(self.occurrences_for_date(date)?);
            date += Duration::days(1);
        }
        Ok(result)
    }

    /// 物化并返回指定教学周的全部课次
    ///
    /// # 规则
    /// - 周序号越界 (不在 1..=周数) 返回空列表
    /// - 首尾周可能被学期边界裁剪, 只物化在学期内的教学日
    #[instrument(skip(self))]
    pub fn occurrences_for_week(&self, week_no: u32) -> EngineResult<Vec<LessonOccurrence>> {
        if !self.calendar.contains_week(week_no) {
            return Ok(Vec::new());
        }
        let mut result = Vec::new();
        for date in self.calendar.teaching_dates_in_week(week_no) {
            result.extend(self.occurrences_for_date(date)?);
        }
        Ok(result)
    }

    /// 物化并返回指定月份 (学期内部分) 的全部课次
    ///
    /// # 规则
    /// - 月份与学期无交集时返回空列表
    #[instrument(skip(self))]
    pub fn occurrences_for_month(
        &self,
        year: i32,
        month: u32,
    ) -> EngineResult<Vec<LessonOccurrence>> {
        let mut result = Vec::new();
        for date in self.calendar.teaching_dates_in_month(year, month) {
            result.extend(self.occurrences_for_date(date)?);
        }
        Ok(result)
    }

    /// 当前生效的学期日历
    pub fn calendar(&self) -> &SemesterCalendar {
        &self.calendar
    }
}
