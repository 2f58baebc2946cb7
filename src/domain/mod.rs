// ==========================================
// 高校排课系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、日历运算
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod calendar;
pub mod entities;
pub mod lesson;
pub mod slot_option;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use calendar::{CalendarError, SemesterCalendar};
pub use entities::{Course, Room, StudentGroup, Teacher};
pub use lesson::{same_pattern, LessonOccurrence, LessonPattern};
pub use slot_option::SlotOption;
pub use types::{
    weekday_from_db_str, weekday_ordinal, weekday_to_db_str, weekday_zh, Period, WeekParity,
    TEACHING_WEEKDAYS,
};
