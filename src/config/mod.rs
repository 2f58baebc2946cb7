// ==========================================
// 高校排课系统 - 配置层
// ==========================================
// 职责: 学期边界与校验模式的持久化配置
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigError, ConfigManager, ConfigResult};
