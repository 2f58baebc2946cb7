// ==========================================
// 高校排课系统 - 操作日志数据仓储
// ==========================================
// 红线: 所有调课写入必须落审计日志
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
