// ==========================================
// 高校排课系统 - 课次领域模型
// ==========================================
// 职责: 周期模板 (LessonPattern) 与具体课次 (LessonOccurrence)
// 红线: pattern_id 只是弱引用回链,不做对象图
// ==========================================

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::types::{weekday_serde, Period, WeekParity};

// ==========================================
// LessonPattern - 周期排课模板
// ==========================================
// 含义: 匹配 week_parity 的每个教学周,在 weekday 的 period 节,
//       course/group/teacher 在 room 上课
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPattern {
    pub pattern_id: Option<i64>, // 模板ID (None = 尚未入库)
    pub week_parity: WeekParity, // 单双周
    #[serde(with = "weekday_serde")]
    pub weekday: Weekday,        // 星期
    pub period: Period,          // 节次
    pub room_id: i64,            // 教室
    pub course_id: i64,          // 课程
    pub group_id: i64,           // 班级
    pub teacher_id: i64,         // 教师
}

impl LessonPattern {
    /// 是否占用某个周期槽位 (星期 + 节次 + 教室)
    pub fn occupies_slot(&self, weekday: Weekday, period: Period, room_id: i64) -> bool {
        self.weekday == weekday && self.period == period && self.room_id == room_id
    }
}

// ==========================================
// LessonOccurrence - 具体课次
// ==========================================
// 两种来源,不设标志位,仅凭出处区分:
// - 生成: 由模板投影到某个教学日,首次读取时落库
// - 例外: 被单次调课改出模板定义的已落库行 (保留 pattern_id 作为出处),
//         或 pattern_id 为 None 的独立课次
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonOccurrence {
    pub occurrence_id: Option<i64>, // 课次ID (None = 尚未入库)
    pub pattern_id: Option<i64>,    // 出处模板ID (None = 独立课次)
    pub lesson_date: NaiveDate,     // 上课日期
    #[serde(with = "weekday_serde")]
    pub weekday: Weekday,           // 星期 (与 lesson_date 一致)
    pub period: Period,             // 节次
    pub room_id: i64,               // 教室
    pub course_id: i64,             // 课程
    pub group_id: i64,              // 班级
    pub teacher_id: i64,            // 教师
}

impl LessonOccurrence {
    /// 将模板投影到指定日期,生成未入库的课次
    pub fn from_pattern(pattern: &LessonPattern, date: NaiveDate) -> Self {
        Self {
            occurrence_id: None,
            pattern_id: pattern.pattern_id,
            lesson_date: date,
            weekday: date.weekday(),
            period: pattern.period,
            room_id: pattern.room_id,
            course_id: pattern.course_id,
            group_id: pattern.group_id,
            teacher_id: pattern.teacher_id,
        }
    }

    /// 判断两条课次是否为同一次课
    ///
    /// # 规则
    /// - 双方均已入库: 按 occurrence_id
    /// - 否则: 按 (pattern_id, lesson_date),要求 pattern_id 均存在
    pub fn is_same_meeting(&self, other: &LessonOccurrence) -> bool {
        match (self.occurrence_id, other.occurrence_id) {
            (Some(a), Some(b)) => a == b,
            _ => {
                same_pattern(self.pattern_id, other.pattern_id)
                    && self.lesson_date == other.lesson_date
            }
        }
    }

    /// 是否为模板 pattern_id 在当日的课次
    pub fn belongs_to_pattern(&self, pattern_id: i64) -> bool {
        self.pattern_id == Some(pattern_id)
    }
}

/// 两个出处模板ID是否指向同一模板 (双方均存在才算)
pub fn same_pattern(a: Option<i64>, b: Option<i64>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}
