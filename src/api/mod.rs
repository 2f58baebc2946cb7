// ==========================================
// 高校排课系统 - API 层
// ==========================================
// 职责: 提供课表查询与调课提交的业务接口, 供 CLI 调用
// ==========================================

pub mod error;
pub mod reschedule_api;
pub mod timetable_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use reschedule_api::{RescheduleApi, RescheduleSummary, SlotOptionView};
pub use timetable_api::{DayBucket, OccurrenceView, PatternView, TimetableApi, WeekView};
pub use validator::{RescheduleValidator, ValidationMode};
