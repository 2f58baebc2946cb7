// ==========================================
// 高校排课系统 - 应用层
// ==========================================
// 职责: 共享状态装配, 连接 CLI 与业务层
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
