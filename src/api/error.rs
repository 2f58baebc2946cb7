// ==========================================
// 高校排课系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 把下层技术错误翻译成用户可读的业务错误
// 红线: 调课失败必须可解释 — 每个错误带显式原因和稳定错误码
// ==========================================

use crate::config::config_manager::ConfigError;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 业务结果错误 =====
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("非法请求: {0}")]
    InvalidRequest(String),

    #[error("槽位冲突: {0}")]
    Conflict(String),

    #[error("数据不一致: {0}")]
    InconsistentState(String),

    /// 调课前置校验失败 (带逐字段违规清单)
    #[error("调课校验失败: {reason}")]
    ValidationFailed {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    // ===== 技术错误 =====
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 稳定错误码 (前端按码分派提示文案)
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InconsistentState(_) => "INCONSISTENT_STATE",
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::Internal(_) => "INTERNAL",
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 校验违规详情
// ==========================================
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationViolation {
    /// 违规字段 (occurrence_id / new_date / option_id ...)
    pub field: String,
    /// 违规码 (NON_POSITIVE_ID / WEEKDAY_MISMATCH / ...)
    pub code: String,
    /// 违规原因
    pub message: String,
}

// ==========================================
// 从下层错误转换
// 目的: 仓储/引擎/配置错误各归各类, 技术细节折叠进 Internal
// ==========================================

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::Conflict(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::InvalidRequest(format!("外键约束违反: {}", msg))
            }
            RepositoryError::InvalidInput(msg) => ApiError::InvalidRequest(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidRequest(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::DatabaseConnectionError(msg)
            | RepositoryError::LockError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::InternalError(msg) => ApiError::Internal(msg),
            RepositoryError::Other(err) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            EngineError::Conflict(msg) => ApiError::Conflict(msg),
            EngineError::InconsistentState(msg) => ApiError::InconsistentState(msg),
            EngineError::Repository(err) => err.into(),
            EngineError::Calendar(err) => ApiError::InvalidRequest(err.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingKey(key) => {
                ApiError::InvalidRequest(format!("配置缺失: {} (请先配置学期)", key))
            }
            ConfigError::InvalidValue { key, value, message } => ApiError::InconsistentState(
                format!("配置值非法: {} = {} ({})", key, value, message),
            ),
            ConfigError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}
