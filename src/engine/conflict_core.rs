// ==========================================
// 高校排课系统 - 冲突判定核心 (纯函数)
// ==========================================
// 职责: 两级冲突规则的无副作用实现
// 红线: 本模块不做 I/O, 不碰仓储; 判定必须可单测
// ==========================================
// 规则一 (教室精确): 槽位三元组 (星期, 节次, 教室) 已被占则排除,
//         不看占用者身份, 也不豁免目标自身 (原槽位不是调课目标)
// 规则二 (师生任意教室): 同 (星期, 节次) 下目标的教师或班级另有课
//         则排除; 目标自己的那次课 (及永久调课时其整个模板) 豁免
// ==========================================

use crate::domain::lesson::{same_pattern, LessonOccurrence, LessonPattern};
use crate::domain::slot_option::SlotOption;
use crate::domain::types::{weekday_zh, Period};
use chrono::Weekday;
use std::fmt;

// ==========================================
// ExemptionScope - 规则二的豁免范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptionScope {
    /// 单次调课: 仅豁免目标课次本身 (模板层豁免同模板)
    OneOff,
    /// 永久调课: 豁免目标所属模板的全部课次 (整个模板一起腾位)
    Permanent,
}

// ==========================================
// SlotConflict - 冲突判定结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotConflict {
    /// 规则一命中: 教室在该槽位已有课
    RoomOccupied {
        weekday: Weekday,
        period: Period,
        room_id: i64,
    },
    /// 规则二命中: 教师或班级在该节次另有课
    PartyEngaged {
        weekday: Weekday,
        period: Period,
        shared_teacher: bool,
        shared_group: bool,
    },
}

impl fmt::Display for SlotConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotConflict::RoomOccupied {
                weekday,
                period,
                room_id,
            } => write!(
                f,
                "教室占用冲突: {} {} 教室{}已有课",
                weekday_zh(*weekday),
                period,
                room_id
            ),
            SlotConflict::PartyEngaged {
                weekday,
                period,
                shared_teacher,
                shared_group,
            } => {
                let who = match (shared_teacher, shared_group) {
                    (true, true) => "教师和班级",
                    (true, false) => "教师",
                    _ => "班级",
                };
                write!(
                    f,
                    "师生占用冲突: {} {} {}另有课",
                    weekday_zh(*weekday),
                    period,
                    who
                )
            }
        }
    }
}

// ==========================================
// ConflictCore - 冲突判定核心
// ==========================================
// 红线: 入参即全部事实 — 忙碌模板 + 忙碌课次 + 目标 + 候选
pub struct ConflictCore;

impl ConflictCore {
    /// 规则一: 教室精确冲突
    ///
    /// # 规则
    /// - 任一忙碌模板或忙碌课次占用 候选的 (星期, 节次, 教室) 即冲突
    /// - 无任何豁免: 目标自己当前的槽位同样视为被占
    ///   (把课"移"到原槽位不是一次调课)
    pub fn room_conflict(
        busy_patterns: &[LessonPattern],
        busy_occurrences: &[LessonOccurrence],
        option: &SlotOption,
    ) -> Option<SlotConflict> {
        let pattern_hit = busy_patterns
            .iter()
            .any(|p| p.occupies_slot(option.weekday, option.period, option.room_id));
        let occurrence_hit = busy_occurrences.iter().any(|o| {
            o.weekday == option.weekday && o.period == option.period && o.room_id == option.room_id
        });
        if pattern_hit || occurrence_hit {
            return Some(SlotConflict::RoomOccupied {
                weekday: option.weekday,
                period: option.period,
                room_id: option.room_id,
            });
        }
        None
    }

    /// 规则二: 师生任意教室冲突
    ///
    /// # 规则
    /// - 任一忙碌条目与候选同 (星期, 节次), 且其教师或班级与目标相同,
    ///   即冲突 (换个教室也不能让同一批人同时上两门课)
    /// - 豁免 (否则目标自己的节次永远给不出候选):
    ///   - 忙碌模板: 与目标同模板 (目标腾出的就是它的周期槽位)
    ///   - 忙碌课次: 目标课次本身; 永久调课时扩展到同模板的全部课次
    pub fn party_conflict(
        busy_patterns: &[LessonPattern],
        busy_occurrences: &[LessonOccurrence],
        target: &LessonOccurrence,
        option: &SlotOption,
        scope: ExemptionScope,
    ) -> Option<SlotConflict> {
        let mut shared_teacher = false;
        let mut shared_group = false;

        for pattern in busy_patterns {
            if pattern.weekday != option.weekday || pattern.period != option.period {
                continue;
            }
            if same_pattern(pattern.pattern_id, target.pattern_id) {
                continue;
            }
            if pattern.teacher_id == target.teacher_id {
                shared_teacher = true;
            }
            if pattern.group_id == target.group_id {
                shared_group = true;
            }
        }

        for occurrence in busy_occurrences {
            if occurrence.weekday != option.weekday || occurrence.period != option.period {
                continue;
            }
            let exempt = match scope {
                ExemptionScope::OneOff => occurrence.is_same_meeting(target),
                ExemptionScope::Permanent => {
                    occurrence.is_same_meeting(target)
                        || same_pattern(occurrence.pattern_id, target.pattern_id)
                }
            };
            if exempt {
                continue;
            }
            if occurrence.teacher_id == target.teacher_id {
                shared_teacher = true;
            }
            if occurrence.group_id == target.group_id {
                shared_group = true;
            }
        }

        if shared_teacher || shared_group {
            return Some(SlotConflict::PartyEngaged {
                weekday: option.weekday,
                period: option.period,
                shared_teacher,
                shared_group,
            });
        }
        None
    }

    /// 完整判定单个候选槽位
    ///
    /// # 返回
    /// - `None`: 槽位空闲, 可作为调课目标
    /// - `Some(conflict)`: 命中的第一条规则 (规则一优先)
    pub fn check_option(
        busy_patterns: &[LessonPattern],
        busy_occurrences: &[LessonOccurrence],
        target: &LessonOccurrence,
        option: &SlotOption,
        scope: ExemptionScope,
    ) -> Option<SlotConflict> {
        if let Some(conflict) = Self::room_conflict(busy_patterns, busy_occurrences, option) {
            return Some(conflict);
        }
        Self::party_conflict(busy_patterns, busy_occurrences, target, option, scope)
    }

    /// 过滤候选列表, 保留空闲槽位
    ///
    /// # 规则
    /// - 保序: 输出顺序与输入一致
    /// - 完备: 幸存者与被排除者合起来恰好是全部候选
    pub fn filter_free_options(
        busy_patterns: &[LessonPattern],
        busy_occurrences: &[LessonOccurrence],
        target: &LessonOccurrence,
        candidates: &[SlotOption],
        scope: ExemptionScope,
    ) -> Vec<SlotOption> {
        candidates
            .iter()
            .filter(|option| {
                Self::check_option(busy_patterns, busy_occurrences, target, option, scope)
                    .is_none()
            })
            .cloned()
            .collect()
    }
}
