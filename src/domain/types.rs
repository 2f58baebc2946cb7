// ==========================================
// 高校排课系统 - 领域类型定义
// ==========================================
// 职责: 定义节次、单双周、星期等基础类型
// 约定: 序列化格式 SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 节次 (Period)
// ==========================================
// 红线: 全序枚举,比较按序号,不是按时间段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    First,  // 第一大节
    Second, // 第二大节
    Third,  // 第三大节
    Fourth, // 第四大节
    Fifth,  // 第五大节
}

impl Period {
    /// 一天内的全部节次,按序号升序
    pub const ALL: [Period; 5] = [
        Period::First,
        Period::Second,
        Period::Third,
        Period::Fourth,
        Period::Fifth,
    ];

    /// 节次序号 (1..=5)
    pub fn ordinal(&self) -> u8 {
        match self {
            Period::First => 1,
            Period::Second => 2,
            Period::Third => 3,
            Period::Fourth => 4,
            Period::Fifth => 5,
        }
    }

    /// 从序号解析节次
    pub fn from_ordinal(n: u8) -> Option<Self> {
        match n {
            1 => Some(Period::First),
            2 => Some(Period::Second),
            3 => Some(Period::Third),
            4 => Some(Period::Fourth),
            5 => Some(Period::Fifth),
            _ => None,
        }
    }

    /// 从字符串解析节次
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "FIRST" => Some(Period::First),
            "SECOND" => Some(Period::Second),
            "THIRD" => Some(Period::Third),
            "FOURTH" => Some(Period::Fourth),
            "FIFTH" => Some(Period::Fifth),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Period::First => "FIRST",
            Period::Second => "SECOND",
            Period::Third => "THIRD",
            Period::Fourth => "FOURTH",
            Period::Fifth => "FIFTH",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 单双周 (Week Parity)
// ==========================================
// 约定: 第1/3/5...教学周为单周,第2/4/6...教学周为双周
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekParity {
    Odd,  // 单周
    Even, // 双周
}

impl WeekParity {
    /// 从教学周序号 (1 起) 计算单双周
    pub fn from_week_no(week_no: u32) -> Self {
        if week_no % 2 == 1 {
            WeekParity::Odd
        } else {
            WeekParity::Even
        }
    }

    /// 判断教学周序号是否匹配本奇偶性
    pub fn matches_week_no(&self, week_no: u32) -> bool {
        *self == WeekParity::from_week_no(week_no)
    }

    /// 从字符串解析单双周
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ODD" => Some(WeekParity::Odd),
            "EVEN" => Some(WeekParity::Even),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WeekParity::Odd => "ODD",
            WeekParity::Even => "EVEN",
        }
    }
}

impl fmt::Display for WeekParity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekParity::Odd => write!(f, "单周"),
            WeekParity::Even => write!(f, "双周"),
        }
    }
}

// ==========================================
// 星期辅助 (Weekday helpers)
// ==========================================
// chrono::Weekday 不直接入库,统一经由字符串映射

/// 教学日 (周一至周五),按序排列
pub const TEACHING_WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// 星期序号 (周一=1 .. 周日=7)
pub fn weekday_ordinal(weekday: Weekday) -> u8 {
    weekday.number_from_monday() as u8
}

/// 转换为数据库存储的字符串
pub fn weekday_to_db_str(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// 从数据库字符串解析星期
pub fn weekday_from_db_str(s: &str) -> Option<Weekday> {
    match s.to_uppercase().as_str() {
        "MONDAY" => Some(Weekday::Mon),
        "TUESDAY" => Some(Weekday::Tue),
        "WEDNESDAY" => Some(Weekday::Wed),
        "THURSDAY" => Some(Weekday::Thu),
        "FRIDAY" => Some(Weekday::Fri),
        "SATURDAY" => Some(Weekday::Sat),
        "SUNDAY" => Some(Weekday::Sun),
        _ => None,
    }
}

/// 星期中文名 (CLI 展示用)
pub fn weekday_zh(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "周一",
        Weekday::Tue => "周二",
        Weekday::Wed => "周三",
        Weekday::Thu => "周四",
        Weekday::Fri => "周五",
        Weekday::Sat => "周六",
        Weekday::Sun => "周日",
    }
}

/// Weekday 的 serde 适配: 以数据库字符串形式序列化,与表结构一致
pub mod weekday_serde {
    use chrono::Weekday;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{weekday_from_db_str, weekday_to_db_str};

    pub fn serialize<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(weekday_to_db_str(*weekday))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let s = String::deserialize(deserializer)?;
        weekday_from_db_str(&s).ok_or_else(|| de::Error::custom(format!("无效星期: {}", s)))
    }
}
