// ==========================================
// 高校排课系统 - 调课 API
// ==========================================
// 职责: 候选槽位查询 + 单次/永久调课提交
// 红线: 写入口必须走 校验 → 引擎 → 审计 三段;
//       只有成功的写入才落一条调课日志, 失败不留痕
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::timetable_api::{
    occurrence_to_view, pattern_to_view, NameMaps, OccurrenceView, PatternView,
};
use crate::api::validator::RescheduleValidator;
use crate::config::config_manager::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::calendar::SemesterCalendar;
use crate::domain::lesson::LessonOccurrence;
use crate::domain::slot_option::SlotOption;
use crate::domain::types::{weekday_to_db_str, weekday_zh};
use crate::engine::conflict::ConflictEngine;
use crate::engine::reschedule::RescheduleEngine;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::entity_repo::EntityRepository;
use crate::repository::occurrence_repo::OccurrenceRepository;
use crate::repository::option_repo::OptionRepository;

/// 无登录态, 审计统一记管理员
const DEFAULT_ACTOR: &str = "admin";

// ==========================================
// SlotOptionView - 候选槽位视图
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotOptionView {
    pub option_id: i64,
    pub weekday: String,
    pub period: String,
    pub room_id: i64,
    pub room_no: String,
}

// ==========================================
// RescheduleSummary - 永久调课结果摘要
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleSummary {
    /// 改写后的模板
    pub pattern: PatternView,
    /// 被级联移动的课次
    pub moved: Vec<OccurrenceView>,
    /// 受影响课次数
    pub affected_count: usize,
}

// ==========================================
// RescheduleApi - 调课 API
// ==========================================
#[derive(Debug)]
pub struct RescheduleApi {
    calendar: SemesterCalendar,
    conflict_engine: Arc<ConflictEngine>,
    reschedule_engine: Arc<RescheduleEngine>,
    occurrence_repo: Arc<OccurrenceRepository>,
    option_repo: Arc<OptionRepository>,
    entity_repo: Arc<EntityRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    validator: Arc<RescheduleValidator>,
    config: Arc<ConfigManager>,
}

impl RescheduleApi {
    /// 创建新的 RescheduleApi 实例
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        calendar: SemesterCalendar,
        conflict_engine: Arc<ConflictEngine>,
        reschedule_engine: Arc<RescheduleEngine>,
        occurrence_repo: Arc<OccurrenceRepository>,
        option_repo: Arc<OptionRepository>,
        entity_repo: Arc<EntityRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        validator: Arc<RescheduleValidator>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            calendar,
            conflict_engine,
            reschedule_engine,
            occurrence_repo,
            option_repo,
            entity_repo,
            action_log_repo,
            validator,
            config,
        }
    }

    // ==========================================
    // 候选查询接口
    // ==========================================

    /// 查询课次在指定日期可落的空闲槽位 (单次调课用)
    #[instrument(skip(self), fields(occurrence_id, date = %date))]
    pub fn options_for_date(
        &self,
        occurrence_id: i64,
        date: NaiveDate,
    ) -> ApiResult<Vec<SlotOptionView>> {
        let target = self.load_occurrence(occurrence_id)?;
        let options = self.conflict_engine.options_for_date(&target, date)?;
        debug!(free = options.len(), "单日候选查询完成");
        self.to_option_views(options)
    }

    /// 查询课次所属模板在指定教学周可迁往的空闲槽位 (永久调课用)
    #[instrument(skip(self), fields(occurrence_id, week_no))]
    pub fn options_for_week(
        &self,
        occurrence_id: i64,
        week_no: u32,
    ) -> ApiResult<Vec<SlotOptionView>> {
        let target = self.load_occurrence(occurrence_id)?;
        let options = self.conflict_engine.options_for_week(&target, week_no)?;
        debug!(free = options.len(), "整周候选查询完成");
        self.to_option_views(options)
    }

    // ==========================================
    // 调课提交接口
    // ==========================================

    /// 单次调课: 只移动这一节课, 周期模板不变
    ///
    /// # 流程
    /// 校验 → 引擎执行 → 审计 → 返回视图
    #[instrument(skip(self), fields(occurrence_id, new_date = %new_date, option_id))]
    pub fn reschedule_once(
        &self,
        occurrence_id: i64,
        new_date: NaiveDate,
        option_id: i64,
    ) -> ApiResult<OccurrenceView> {
        // === 步骤 1: 解析候选槽位 ===
        let option = self.load_option(option_id)?;

        // === 步骤 2: 前置校验 (模式由配置决定) ===
        let mode = self.config.get_validation_mode()?;
        self.validator.validate_reschedule(
            occurrence_id,
            new_date,
            &option,
            &self.calendar,
            mode,
        )?;

        // === 步骤 3: 引擎执行 ===
        let moved = self
            .reschedule_engine
            .reschedule_once(occurrence_id, new_date, &option)?;

        // === 步骤 4: 审计 (仅成功落日志) ===
        let names = NameMaps::load(&self.entity_repo)?;
        let view = occurrence_to_view(&moved, &names)?;
        let log = ActionLog::new(ActionType::RescheduleOnce, DEFAULT_ACTOR.to_string())
            .with_occurrence(occurrence_id)
            .with_payload(&json!({
                "new_date": new_date.format("%Y-%m-%d").to_string(),
                "option_id": option_id,
                "weekday": weekday_to_db_str(option.weekday),
                "period": option.period.to_db_str(),
                "room_id": option.room_id,
            }))
            .with_affected_count(1)
            .with_detail(format!(
                "{} {} 课次{} 移到 {} {} 教室{}",
                view.course_name,
                view.group_name,
                occurrence_id,
                new_date,
                option.period,
                view.room_no
            ));
        self.action_log_repo.insert(&log)?;

        info!(occurrence_id, action_id = %log.action_id, "单次调课已提交");
        Ok(view)
    }

    /// 永久调课: 改写周期模板, 其全部课次级联跟随
    ///
    /// # 流程
    /// 校验 → 引擎执行 → 审计 → 返回摘要
    #[instrument(skip(self), fields(occurrence_id, effective_date = %effective_date, option_id))]
    pub fn reschedule_permanently(
        &self,
        occurrence_id: i64,
        effective_date: NaiveDate,
        option_id: i64,
    ) -> ApiResult<RescheduleSummary> {
        // === 步骤 1: 解析候选槽位 ===
        let option = self.load_option(option_id)?;

        // === 步骤 2: 前置校验 (模式由配置决定) ===
        let mode = self.config.get_validation_mode()?;
        self.validator.validate_reschedule(
            occurrence_id,
            effective_date,
            &option,
            &self.calendar,
            mode,
        )?;

        // === 步骤 3: 引擎执行 ===
        let outcome = self
            .reschedule_engine
            .reschedule_permanently(occurrence_id, effective_date, &option)?;

        // === 步骤 4: 审计 (仅成功落日志) ===
        let names = NameMaps::load(&self.entity_repo)?;
        let pattern_view = pattern_to_view(&outcome.pattern, &names)?;
        let mut moved_views = Vec::new();
        for occurrence in &outcome.moved {
            moved_views.push(occurrence_to_view(occurrence, &names)?);
        }

        let log = ActionLog::new(ActionType::ReschedulePermanent, DEFAULT_ACTOR.to_string())
            .with_occurrence(occurrence_id)
            .with_pattern(pattern_view.pattern_id)
            .with_payload(&json!({
                "effective_date": effective_date.format("%Y-%m-%d").to_string(),
                "option_id": option_id,
                "week_parity": pattern_view.week_parity,
                "weekday": weekday_to_db_str(option.weekday),
                "period": option.period.to_db_str(),
                "room_id": option.room_id,
            }))
            .with_affected_count(moved_views.len() as i64)
            .with_detail(format!(
                "{} {} 整体迁到 {}{} {} 教室{}, 波及 {} 节课",
                pattern_view.course_name,
                pattern_view.group_name,
                outcome.pattern.week_parity,
                weekday_zh(option.weekday),
                option.period,
                pattern_view.room_no,
                moved_views.len()
            ));
        self.action_log_repo.insert(&log)?;

        info!(
            occurrence_id,
            pattern_id = pattern_view.pattern_id,
            affected = moved_views.len(),
            action_id = %log.action_id,
            "永久调课已提交"
        );
        Ok(RescheduleSummary {
            pattern: pattern_view,
            affected_count: moved_views.len(),
            moved: moved_views,
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load_occurrence(&self, occurrence_id: i64) -> ApiResult<LessonOccurrence> {
        self.occurrence_repo
            .find_by_id(occurrence_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("LessonOccurrence(id={})不存在", occurrence_id))
            })
    }

    fn load_option(&self, option_id: i64) -> ApiResult<SlotOption> {
        self.option_repo
            .find_by_id(option_id)?
            .ok_or_else(|| ApiError::NotFound(format!("SlotOption(id={})不存在", option_id)))
    }

    /// 槽位 → 视图, 按 (星期, 节次, 教室编号) 排序展示
    fn to_option_views(&self, options: Vec<SlotOption>) -> ApiResult<Vec<SlotOptionView>> {
        let names = NameMaps::load(&self.entity_repo)?;
        let mut views: Vec<SlotOptionView> = options
            .iter()
            .map(|o| SlotOptionView {
                option_id: o.option_id,
                weekday: weekday_to_db_str(o.weekday).to_string(),
                period: o.period.to_db_str().to_string(),
                room_id: o.room_id,
                room_no: names.room_no(o.room_id),
            })
            .collect();
        views.sort_by(|a, b| {
            let ka = (sort_key_weekday(&a.weekday), sort_key_period(&a.period));
            let kb = (sort_key_weekday(&b.weekday), sort_key_period(&b.period));
            ka.cmp(&kb).then_with(|| a.room_no.cmp(&b.room_no))
        });
        Ok(views)
    }
}

fn sort_key_weekday(weekday: &str) -> u8 {
    crate::domain::types::weekday_from_db_str(weekday)
        .map(crate::domain::types::weekday_ordinal)
        .unwrap_or(u8::MAX)
}

fn sort_key_period(period: &str) -> u8 {
    crate::domain::types::Period::from_str(period)
        .map(|p| p.ordinal())
        .unwrap_or(u8::MAX)
}
