// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::Weekday;

use campus_timetable::domain::lesson::LessonPattern;
use campus_timetable::domain::types::{Period, WeekParity};

// ==========================================
// LessonPattern 构建器
// ==========================================

/// 排课模板构建器
///
/// 缺省值: 单周 周一 第一节, 全部外键为 1
pub struct PatternBuilder {
    week_parity: WeekParity,
    weekday: Weekday,
    period: Period,
    room_id: i64,
    course_id: i64,
    group_id: i64,
    teacher_id: i64,
}

impl PatternBuilder {
    pub fn new() -> Self {
        Self {
            week_parity: WeekParity::Odd,
            weekday: Weekday::Mon,
            period: Period::First,
            room_id: 1,
            course_id: 1,
            group_id: 1,
            teacher_id: 1,
        }
    }

    pub fn parity(mut self, parity: WeekParity) -> Self {
        self.week_parity = parity;
        self
    }

    pub fn weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = weekday;
        self
    }

    pub fn period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn room(mut self, room_id: i64) -> Self {
        self.room_id = room_id;
        self
    }

    pub fn course(mut self, course_id: i64) -> Self {
        self.course_id = course_id;
        self
    }

    pub fn group(mut self, group_id: i64) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn teacher(mut self, teacher_id: i64) -> Self {
        self.teacher_id = teacher_id;
        self
    }

    pub fn build(self) -> LessonPattern {
        LessonPattern {
            pattern_id: None,
            week_parity: self.week_parity,
            weekday: self.weekday,
            period: self.period,
            room_id: self.room_id,
            course_id: self.course_id,
            group_id: self.group_id,
            teacher_id: self.teacher_id,
        }
    }
}

impl Default for PatternBuilder {
    fn default() -> Self {
        Self::new()
    }
}
