// ==========================================
// 高校排课系统 - 引擎层错误类型
// ==========================================
// 红线: 调课失败必须区分原因 (找不到/非法请求/冲突/数据不一致)
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::calendar::CalendarError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 业务结果错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("非法请求: {0}")]
    InvalidRequest(String),

    #[error("槽位冲突: {0}")]
    Conflict(String),

    #[error("数据不一致: {0}")]
    InconsistentState(String),

    // ===== 下层错误透传 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

impl EngineError {
    /// 便捷构造: 记录未找到
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
