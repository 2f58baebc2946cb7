// ==========================================
// 高校排课系统 - 冲突检测引擎 (编排层)
// ==========================================
// 职责: 组装忙碌集 + 候选集, 交给 ConflictCore 过滤
// 红线: 忙碌集必须同时覆盖两层存储 — 已入库课次 (查询即物化)
//       和命中奇偶的模板 (未物化日期的周期性占位同样有效)
// ==========================================
// 两级规则 (实现见 conflict_core.rs):
//   规则一 教室精确: (星期, 节次, 教室) 被占即排除, 无豁免
//   规则二 师生任意教室: 同 (星期, 节次) 下师生另有课即排除,
//          目标自身 (永久调课时其整个模板) 豁免
// ==========================================

use crate::domain::calendar::SemesterCalendar;
use crate::domain::lesson::{LessonOccurrence, LessonPattern};
use crate::domain::slot_option::SlotOption;
use crate::engine::conflict_core::{ConflictCore, ExemptionScope, SlotConflict};
use crate::engine::error::EngineResult;
use crate::engine::materializer::MaterializerEngine;
use crate::repository::option_repo::OptionRepository;
use crate::repository::pattern_repo::PatternRepository;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// ConflictEngine - 冲突检测引擎
// ==========================================
#[derive(Debug)]
pub struct ConflictEngine {
    calendar: SemesterCalendar,
    materializer: Arc<MaterializerEngine>,
    pattern_repo: Arc<PatternRepository>,
    option_repo: Arc<OptionRepository>,
}

impl ConflictEngine {
    /// 创建新的 ConflictEngine 实例
    ///
    /// # 参数
    /// - calendar: 学期日历
    /// - materializer: 物化引擎 (构建忙碌集时顺带补齐课次)
    /// - pattern_repo: 模板仓储
    /// - option_repo: 候选槽位目录
    pub fn new(
        calendar: SemesterCalendar,
        materializer: Arc<MaterializerEngine>,
        pattern_repo: Arc<PatternRepository>,
        option_repo: Arc<OptionRepository>,
    ) -> Self {
        Self {
            calendar,
            materializer,
            pattern_repo,
            option_repo,
        }
    }

    /// 单日候选: 目标课次在指定日期可落的空闲槽位 (单次调课用)
    ///
    /// # 规则
    /// - 非教学日返回空列表
    /// - 候选 = 该星期的全部目录槽位
    /// - 豁免范围: 单次 (仅目标课次本身豁免规则二)
    ///
    /// # 返回
    /// - Vec<SlotOption>: 目录序 (节次, 教室) 的空闲槽位
    #[instrument(skip(self, target), fields(occurrence_id = ?target.occurrence_id, date = %date))]
    pub fn options_for_date(
        &self,
        target: &LessonOccurrence,
        date: NaiveDate,
    ) -> EngineResult<Vec<SlotOption>> {
        // === 步骤 1: 日期归属检查 ===
        if !self.calendar.is_semester_date(date) {
            return Ok(Vec::new());
        }

        // === 步骤 2: 构建忙碌集 (模板层 + 课次层) ===
        let (busy_patterns, busy_occurrences) = self.busy_for_date(date)?;

        // === 步骤 3: 候选集 = 该星期的目录槽位 ===
        let candidates = self.option_repo.find_by_weekday(date.weekday())?;

        // === 步骤 4: 两级规则过滤 ===
        let free = ConflictCore::filter_free_options(
            &busy_patterns,
            &busy_occurrences,
            target,
            &candidates,
            ExemptionScope::OneOff,
        );
        debug!(
            candidates = candidates.len(),
            free = free.len(),
            "单日候选过滤完成"
        );
        Ok(free)
    }

    /// 整周候选: 目标模板在指定教学周可迁往的空闲槽位 (永久调课用)
    ///
    /// # 规则
    /// - 周序号越界返回空列表
    /// - 候选 = 全目录中星期落在该周实际教学日内的槽位
    ///   (首尾残缺周只提供学期内的星期)
    /// - 豁免范围: 永久 (目标模板的全部课次一起腾位)
    #[instrument(skip(self, target), fields(occurrence_id = ?target.occurrence_id))]
    pub fn options_for_week(
        &self,
        target: &LessonOccurrence,
        week_no: u32,
    ) -> EngineResult<Vec<SlotOption>> {
        // === 步骤 1: 周序号检查 ===
        if !self.calendar.contains_week(week_no) {
            return Ok(Vec::new());
        }

        // === 步骤 2: 构建全周忙碌集 ===
        let parity = self
            .calendar
            .week_parity_of(self.calendar.week_monday(week_no));
        let busy_patterns = self.pattern_repo.find_for_week(parity)?;
        let busy_occurrences = self.materializer.occurrences_for_week(week_no)?;

        // === 步骤 3: 候选集 = 全目录按该周教学日裁剪 ===
        let teaching_weekdays: HashSet<Weekday> = self
            .calendar
            .teaching_dates_in_week(week_no)
            .iter()
            .map(|d| d.weekday())
            .collect();
        let candidates: Vec<SlotOption> = self
            .option_repo
            .all()?
            .into_iter()
            .filter(|o| teaching_weekdays.contains(&o.weekday))
            .collect();

        // === 步骤 4: 两级规则过滤 (永久豁免范围) ===
        let free = ConflictCore::filter_free_options(
            &busy_patterns,
            &busy_occurrences,
            target,
            &candidates,
            ExemptionScope::Permanent,
        );
        debug!(
            week_no,
            candidates = candidates.len(),
            free = free.len(),
            "整周候选过滤完成"
        );
        Ok(free)
    }

    /// 复核单个槽位在指定日期是否空闲 (调课前的最终闸门)
    ///
    /// # 返回
    /// - None: 空闲, 可提交
    /// - Some(conflict): 命中的冲突 (规则一优先)
    pub fn check_option_on_date(
        &self,
        target: &LessonOccurrence,
        date: NaiveDate,
        option: &SlotOption,
        scope: ExemptionScope,
    ) -> EngineResult<Option<SlotConflict>> {
        let (busy_patterns, busy_occurrences) = self.busy_for_date(date)?;
        Ok(ConflictCore::check_option(
            &busy_patterns,
            &busy_occurrences,
            target,
            option,
            scope,
        ))
    }

    /// 组装单日忙碌集: 命中奇偶的模板 + 当日已物化课次
    fn busy_for_date(
        &self,
        date: NaiveDate,
    ) -> EngineResult<(Vec<LessonPattern>, Vec<LessonOccurrence>)> {
        let parity = self.calendar.week_parity_of(date);
        let busy_patterns = self.pattern_repo.find_for_weekday(parity, date.weekday())?;
        let busy_occurrences = self.materializer.occurrences_for_date(date)?;
        Ok((busy_patterns, busy_occurrences))
    }
}
