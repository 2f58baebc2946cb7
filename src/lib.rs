// ==========================================
// 高校排课系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 课表冲突检测与调课决策支持 (人工最终控制权)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - CLI 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Period, WeekParity, TEACHING_WEEKDAYS};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Course, LessonOccurrence, LessonPattern, Room, SemesterCalendar,
    SlotOption, StudentGroup, Teacher,
};

// 引擎
pub use engine::{
    ConflictCore, ConflictEngine, ExemptionScope, MaterializerEngine, RescheduleEngine,
    RescheduleOutcome, SlotConflict,
};

// API
pub use api::{RescheduleApi, TimetableApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "高校排课系统";

// ==========================================
// 预编译检查
// ==========================================

// 确保编译时所有模块可见
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
