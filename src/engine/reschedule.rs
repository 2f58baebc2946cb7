// ==========================================
// 高校排课系统 - 调课执行引擎
// ==========================================
// 职责: 单次调课 (改课次) 与永久调课 (改模板 + 级联改课次)
// 红线: 提交前必须复核槽位空闲 — 候选列表可能已经过期
// 红线: 单次调课不碰 pattern_id, 行降级为例外行;
//       原日期的缺口由下次读取重新物化补齐
// 红线: 永久调课要求课次可溯源到模板, 溯源断裂报数据不一致,
//       绝不静默降级为单次调课
// ==========================================

use crate::domain::calendar::SemesterCalendar;
use crate::domain::lesson::{LessonOccurrence, LessonPattern};
use crate::domain::slot_option::SlotOption;
use crate::engine::conflict::ConflictEngine;
use crate::engine::conflict_core::ExemptionScope;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::error::RepositoryError;
use crate::repository::occurrence_repo::OccurrenceRepository;
use crate::repository::pattern_repo::PatternRepository;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// RescheduleOutcome - 永久调课结果
// ==========================================
/// 永久调课的完整影响: 改写后的模板 + 被级联改写的全部课次
#[derive(Debug, Clone, Serialize)]
pub struct RescheduleOutcome {
    /// 改写后的模板 (新奇偶/星期/节次/教室)
    pub pattern: LessonPattern,
    /// 被级联改写的课次 (按日期排序)
    pub moved: Vec<LessonOccurrence>,
}

// ==========================================
// RescheduleEngine - 调课执行引擎
// ==========================================
#[derive(Debug)]
pub struct RescheduleEngine {
    calendar: SemesterCalendar,
    conflict: Arc<ConflictEngine>,
    pattern_repo: Arc<PatternRepository>,
    occurrence_repo: Arc<OccurrenceRepository>,
}

impl RescheduleEngine {
    /// 创建新的 RescheduleEngine 实例
    pub fn new(
        calendar: SemesterCalendar,
        conflict: Arc<ConflictEngine>,
        pattern_repo: Arc<PatternRepository>,
        occurrence_repo: Arc<OccurrenceRepository>,
    ) -> Self {
        Self {
            calendar,
            conflict,
            pattern_repo,
            occurrence_repo,
        }
    }

    /// 单次调课: 仅移动指定课次, 模板不变
    ///
    /// # 参数
    /// - occurrence_id: 要移动的课次
    /// - new_date: 目标日期 (必须在学期内, 星期须与槽位一致)
    /// - option: 目标槽位
    ///
    /// # 返回
    /// - LessonOccurrence: 改写后的课次 (成为例外行)
    ///
    /// # 错误
    /// - NotFound: 课次不存在
    /// - InvalidRequest: 日期在学期外, 或星期不匹配
    /// - Conflict: 复核发现槽位已被占
    #[instrument(skip(self, option), fields(option_id = option.option_id))]
    pub fn reschedule_once(
        &self,
        occurrence_id: i64,
        new_date: NaiveDate,
        option: &SlotOption,
    ) -> EngineResult<LessonOccurrence> {
        // === 步骤 1: 加载目标课次 ===
        let target = self
            .occurrence_repo
            .find_by_id(occurrence_id)?
            .ok_or_else(|| EngineError::not_found("LessonOccurrence", occurrence_id))?;

        // === 步骤 2: 结构校验 (日期/星期) ===
        self.validate_target_slot(new_date, option)?;

        // === 步骤 3: 提交前复核槽位空闲 ===
        if let Some(conflict) =
            self.conflict
                .check_option_on_date(&target, new_date, option, ExemptionScope::OneOff)?
        {
            return Err(EngineError::Conflict(conflict.to_string()));
        }

        // === 步骤 4: 改写课次并落库 ===
        // pattern_id 保持不变: 行成为例外行, 原日期缺口由读取时重新物化
        let mut updated = target.clone();
        updated.lesson_date = new_date;
        updated.weekday = new_date.weekday();
        updated.period = option.period;
        updated.room_id = option.room_id;
        self.occurrence_repo
            .update(&updated)
            .map_err(|e| Self::unique_to_conflict(e, "目标槽位已被占用"))?;

        info!(
            occurrence_id,
            new_date = %new_date,
            period = %option.period,
            room_id = option.room_id,
            "单次调课完成"
        );
        Ok(updated)
    }

    /// 永久调课: 改写模板并级联改写其全部已物化课次
    ///
    /// # 参数
    /// - occurrence_id: 发起调课的课次 (用于定位模板)
    /// - effective_date: 新周期的代表日期 (决定新奇偶与新星期)
    /// - option: 目标槽位
    ///
    /// # 返回
    /// - RescheduleOutcome: 新模板 + 全部被移动的课次
    ///
    /// # 错误
    /// - NotFound: 课次不存在
    /// - InconsistentState: 课次未关联模板, 或声明的模板不存在
    /// - InvalidRequest: 日期在学期外, 或星期不匹配
    /// - Conflict: 复核发现槽位被占, 或级联与既有例外行撞车
    #[instrument(skip(self, option), fields(option_id = option.option_id))]
    pub fn reschedule_permanently(
        &self,
        occurrence_id: i64,
        effective_date: NaiveDate,
        option: &SlotOption,
    ) -> EngineResult<RescheduleOutcome> {
        // === 步骤 1: 加载课次并溯源到模板 ===
        let target = self
            .occurrence_repo
            .find_by_id(occurrence_id)?
            .ok_or_else(|| EngineError::not_found("LessonOccurrence", occurrence_id))?;
        let pattern_id = target.pattern_id.ok_or_else(|| {
            EngineError::InconsistentState(format!(
                "课次 {} 未关联模板, 无法永久调课",
                occurrence_id
            ))
        })?;
        self.pattern_repo.find_by_id(pattern_id)?.ok_or_else(|| {
            EngineError::InconsistentState(format!(
                "课次 {} 声明的模板 {} 不存在",
                occurrence_id, pattern_id
            ))
        })?;

        // === 步骤 2: 结构校验 (日期/星期) ===
        self.validate_target_slot(effective_date, option)?;

        // === 步骤 3: 提交前复核槽位空闲 (永久豁免范围) ===
        if let Some(conflict) = self.conflict.check_option_on_date(
            &target,
            effective_date,
            option,
            ExemptionScope::Permanent,
        )? {
            return Err(EngineError::Conflict(conflict.to_string()));
        }

        // === 步骤 4: 改写模板 (奇偶 + 槽位) ===
        let new_parity = self.calendar.week_parity_of(effective_date);
        self.pattern_repo
            .update_parity(pattern_id, new_parity)
            .map_err(|e| Self::unique_to_conflict(e, "模板奇偶改写与既有模板冲突"))?;
        self.pattern_repo
            .update_slot(pattern_id, option.weekday, option.period, option.room_id)
            .map_err(|e| Self::unique_to_conflict(e, "模板槽位改写与既有模板冲突"))?;

        // === 步骤 5: 级联改写全部已物化课次 ===
        // 级联目标槽位被无关例外行占用时, 事务整体回滚报冲突
        let moved = self
            .occurrence_repo
            .shift_all_for_pattern(pattern_id, option.weekday, option.period, option.room_id)
            .map_err(|e| Self::unique_to_conflict(e, "级联改写与既有课次冲突"))?;

        // === 步骤 6: 读回改写后的模板 ===
        let pattern = self.pattern_repo.find_by_id(pattern_id)?.ok_or_else(|| {
            EngineError::InconsistentState(format!("模板 {} 在改写后消失", pattern_id))
        })?;

        info!(
            occurrence_id,
            pattern_id,
            effective_date = %effective_date,
            moved = moved.len(),
            "永久调课完成"
        );
        Ok(RescheduleOutcome { pattern, moved })
    }

    /// 结构校验: 目标日期在学期内, 且星期与槽位一致
    fn validate_target_slot(&self, date: NaiveDate, option: &SlotOption) -> EngineResult<()> {
        if !self.calendar.is_semester_date(date) {
            return Err(EngineError::InvalidRequest(format!(
                "目标日期 {} 不在学期 {} ~ {} 内",
                date,
                self.calendar.semester_start(),
                self.calendar.semester_end()
            )));
        }
        if date.weekday() != option.weekday {
            return Err(EngineError::InvalidRequest(format!(
                "目标日期 {} 是{}, 与槽位的{}不一致",
                date,
                crate::domain::types::weekday_zh(date.weekday()),
                crate::domain::types::weekday_zh(option.weekday)
            )));
        }
        Ok(())
    }

    /// 唯一约束冲突翻译为业务冲突, 其余仓储错误原样透传
    fn unique_to_conflict(err: RepositoryError, context: &str) -> EngineError {
        match err {
            RepositoryError::UniqueConstraintViolation(msg) => {
                EngineError::Conflict(format!("{}: {}", context, msg))
            }
            other => EngineError::Repository(other),
        }
    }
}
