// ==========================================
// 高校排课系统 - 调课日志领域模型
// ==========================================
// 职责: 调课操作的审计记录
// 红线: 所有调课写入必须记录;日志只追加,不支持回滚
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 调课日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,          // 日志ID (UUID)
    pub action_type: String,        // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,   // 操作时间戳
    pub actor: String,              // 操作人
    pub occurrence_id: Option<i64>, // 目标课次
    pub pattern_id: Option<i64>,    // 关联模板 (永久调课)
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub affected_count: i64,        // 受影响课次数
    pub detail: Option<String>,     // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    RescheduleOnce,      // 单次调课
    ReschedulePermanent, // 永久调课
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::RescheduleOnce => "RescheduleOnce",
            ActionType::ReschedulePermanent => "ReschedulePermanent",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RescheduleOnce" => Some(ActionType::RescheduleOnce),
            "ReschedulePermanent" => Some(ActionType::ReschedulePermanent),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的调课日志
    ///
    /// # 参数
    /// - `action_type`: 操作类型
    /// - `actor`: 操作人
    pub fn new(action_type: ActionType, actor: String) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor,
            occurrence_id: None,
            pattern_id: None,
            payload_json: None,
            affected_count: 0,
            detail: None,
        }
    }

    /// 设置目标课次
    pub fn with_occurrence(mut self, occurrence_id: i64) -> Self {
        self.occurrence_id = Some(occurrence_id);
        self
    }

    /// 设置关联模板
    pub fn with_pattern(mut self, pattern_id: i64) -> Self {
        self.pattern_id = Some(pattern_id);
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置受影响课次数
    pub fn with_affected_count(mut self, count: i64) -> Self {
        self.affected_count = count;
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    /// 简短摘要文本 (CLI 展示用)
    pub fn summary_text(&self) -> String {
        let kind = match ActionType::from_str(&self.action_type) {
            Some(ActionType::RescheduleOnce) => "单次调课",
            Some(ActionType::ReschedulePermanent) => "永久调课",
            None => "未知操作",
        };
        match &self.detail {
            Some(detail) => format!("{}: {}", kind, detail),
            None => format!("{} (影响 {} 节课)", kind, self.affected_count),
        }
    }
}
