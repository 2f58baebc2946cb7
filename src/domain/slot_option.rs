// ==========================================
// 高校排课系统 - 可调课槽位
// ==========================================
// 职责: 静态槽位目录条目 (星期 × 节次 × 教室)
// 约束: 一次性播种,之后只读;不携带占用信息
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::domain::types::{weekday_serde, Period};

// ==========================================
// SlotOption - 候选槽位
// ==========================================
// 同一槽位在某些日期空闲、某些日期被占,由冲突引擎按日判定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotOption {
    pub option_id: i64, // 槽位ID
    #[serde(with = "weekday_serde")]
    pub weekday: Weekday, // 星期
    pub period: Period, // 节次
    pub room_id: i64,   // 教室
}

impl SlotOption {
    /// 槽位三元组是否与给定 (星期, 节次, 教室) 相同
    pub fn matches_slot(&self, weekday: Weekday, period: Period, room_id: i64) -> bool {
        self.weekday == weekday && self.period == period && self.room_id == room_id
    }
}
