// ==========================================
// 高校排课系统 - 学期日历
// ==========================================
// 职责: 学期边界、教学周序号、单双周、月份裁剪的纯日期运算
// 红线: 无状态、无副作用、无 I/O 操作
// 约定: 教学周从周一起算,第 1 周为包含学期首日的那一周
// ==========================================

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::types::WeekParity;

#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("学期边界无效: 开始日期 {start} 晚于结束日期 {end}")]
    InvalidBounds { start: NaiveDate, end: NaiveDate },
}

// ==========================================
// SemesterCalendar - 学期日历
// ==========================================
// 超出范围的周序号/月份一律收敛 (clip),不报错
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterCalendar {
    semester_start: NaiveDate,
    semester_end: NaiveDate,
}

impl SemesterCalendar {
    pub fn new(semester_start: NaiveDate, semester_end: NaiveDate) -> Result<Self, CalendarError> {
        if semester_start > semester_end {
            return Err(CalendarError::InvalidBounds {
                start: semester_start,
                end: semester_end,
            });
        }
        Ok(Self {
            semester_start,
            semester_end,
        })
    }

    pub fn semester_start(&self) -> NaiveDate {
        self.semester_start
    }

    pub fn semester_end(&self) -> NaiveDate {
        self.semester_end
    }

    /// 是否为教学日: 学期范围内且为周一至周五
    pub fn is_semester_date(&self, date: NaiveDate) -> bool {
        date >= self.semester_start
            && date <= self.semester_end
            && !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// 单双周判定,对任意日期均有定义 (纯模运算)
    ///
    /// # 规则
    /// - 以学期首日所在周的周一为基准周
    /// - 周下标 0/2/4... 为单周,1/3/5... 为双周
    pub fn week_parity_of(&self, date: NaiveDate) -> WeekParity {
        if self.week_index_of(date).rem_euclid(2) == 0 {
            WeekParity::Odd
        } else {
            WeekParity::Even
        }
    }

    /// 教学周序号 (1 起),学期范围外返回 None
    ///
    /// 周按周一至周日划分,学期从周三开学时第 1 周为短周
    pub fn week_no_of(&self, date: NaiveDate) -> Option<u32> {
        if date < self.semester_start || date > self.semester_end {
            return None;
        }
        Some((self.week_index_of(date) + 1) as u32)
    }

    /// 学期总教学周数
    pub fn week_count(&self) -> u32 {
        (self.week_index_of(self.semester_end) + 1) as u32
    }

    /// 教学周序号是否落在学期内
    pub fn contains_week(&self, week_no: u32) -> bool {
        week_no >= 1 && week_no <= self.week_count()
    }

    /// 指定教学周的周一。周序号超界时收敛到 [1, week_count]
    ///
    /// 返回的是真实周一,不裁剪到学期边界:
    /// 周三开学的第 1 周,其周一早于学期首日
    pub fn week_monday(&self, week_no: u32) -> NaiveDate {
        let clamped = week_no.clamp(1, self.week_count());
        monday_of(self.semester_start) + Duration::weeks(clamped as i64 - 1)
    }

    /// 指定教学周的周五。周序号超界时收敛
    pub fn week_friday(&self, week_no: u32) -> NaiveDate {
        self.week_monday(week_no) + Duration::days(4)
    }

    /// 自然月首日,裁剪到学期下界
    ///
    /// 月份与学期完全不相交时,返回值可能晚于 month_end_date,
    /// 区间迭代自然为空
    pub fn month_start_date(&self, year: i32, month: u32) -> NaiveDate {
        let clamped_month = month.clamp(1, 12);
        let first = first_day_of_month(year, clamped_month);
        first.max(self.semester_start)
    }

    /// 自然月末日,裁剪到学期上界
    pub fn month_end_date(&self, year: i32, month: u32) -> NaiveDate {
        let clamped_month = month.clamp(1, 12);
        let last = last_day_of_month(year, clamped_month);
        last.min(self.semester_end)
    }

    /// 指定教学周内的全部教学日 (按日期升序)
    pub fn teaching_dates_in_week(&self, week_no: u32) -> Vec<NaiveDate> {
        let monday = self.week_monday(week_no);
        (0..5)
            .map(|i| monday + Duration::days(i))
            .filter(|d| self.is_semester_date(*d))
            .collect()
    }

    /// 指定自然月内的全部教学日 (按日期升序)
    pub fn teaching_dates_in_month(&self, year: i32, month: u32) -> Vec<NaiveDate> {
        let start = self.month_start_date(year, month);
        let end = self.month_end_date(year, month);
        if start > end {
            return Vec::new();
        }
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_semester_date(*d))
            .collect()
    }

    /// 学期全部教学日 (按日期升序)
    pub fn teaching_dates(&self) -> Vec<NaiveDate> {
        self.semester_start
            .iter_days()
            .take_while(|d| *d <= self.semester_end)
            .filter(|d| self.is_semester_date(*d))
            .collect()
    }

    /// 日期所在周相对基准周的下标 (0 起,可为负)
    fn week_index_of(&self, date: NaiveDate) -> i64 {
        let base = monday_of(self.semester_start);
        (monday_of(date) - base).num_days() / 7
    }
}

/// 日期所在周的周一
fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn first_day_of_month(year: i32, month: u32) -> NaiveDate {
    // month 已收敛到 1..=12
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_day_of_month(next_year, next_month) - Duration::days(1)
}
