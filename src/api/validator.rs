// ==========================================
// 高校排课系统 - 调课前置校验器
// ==========================================
// 职责: 调课请求的结构化校验, 在引擎执行前给出逐字段违规清单
// 红线: 违规只报告, 不自动修正; 结构性违规 (坏 id / 查无此课)
//       在任何模式下都拦下
// ==========================================
// 与引擎的分工: 日期/星期/模板溯源引擎自己还会复核,
// 宽松模式下这些只降级为警告; 结构性违规引擎无法兜底, 必须在此失败
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::domain::calendar::SemesterCalendar;
use crate::domain::slot_option::SlotOption;
use crate::domain::types::weekday_zh;
use crate::repository::occurrence_repo::OccurrenceRepository;
use crate::repository::pattern_repo::PatternRepository;

// ==========================================
// ValidationMode - 校验模式
// ==========================================

/// 校验模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationMode {
    /// 严格模式: 任何违规都返回错误
    Strict,
    /// 宽松模式: 引擎会复核的违规降级为警告, 结构性违规仍然失败
    Lenient,
}

impl ValidationMode {
    /// 转换为配置字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "STRICT",
            ValidationMode::Lenient => "LENIENT",
        }
    }

    /// 从配置字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STRICT" => Some(ValidationMode::Strict),
            "LENIENT" => Some(ValidationMode::Lenient),
            _ => None,
        }
    }
}

// ==========================================
// RescheduleValidator - 调课前置校验器
// ==========================================

/// 调课前置校验器
///
/// 校验项:
/// 1. 课次 id 为正且存在 (结构性)
/// 2. 课次内嵌的教室/课程/班级/教师 id 为正 (结构性)
/// 3. 声明的模板可解析 (引擎复核项)
/// 4. 目标日期在学期内 (引擎复核项)
/// 5. 目标日期星期与槽位星期一致 (引擎复核项)
#[derive(Debug)]
pub struct RescheduleValidator {
    occurrence_repo: Arc<OccurrenceRepository>,
    pattern_repo: Arc<PatternRepository>,
}

impl RescheduleValidator {
    /// 创建新的 RescheduleValidator 实例
    pub fn new(
        occurrence_repo: Arc<OccurrenceRepository>,
        pattern_repo: Arc<PatternRepository>,
    ) -> Self {
        Self {
            occurrence_repo,
            pattern_repo,
        }
    }

    /// 校验一次调课请求
    ///
    /// # 参数
    /// - occurrence_id: 要移动的课次
    /// - target_date: 目标日期
    /// - option: 目标槽位
    /// - calendar: 学期日历
    /// - mode: 校验模式
    ///
    /// # 返回
    /// - Ok(warnings): 校验通过, 宽松模式下可能携带降级的警告
    /// - Err(ApiError::ValidationFailed): 校验失败, 带逐字段违规清单
    pub fn validate_reschedule(
        &self,
        occurrence_id: i64,
        target_date: NaiveDate,
        option: &SlotOption,
        calendar: &SemesterCalendar,
        mode: ValidationMode,
    ) -> ApiResult<Vec<ValidationViolation>> {
        let mut violations = Vec::new();

        // === 结构性校验: 课次 id 与存在性 ===
        if occurrence_id <= 0 {
            violations.push(ValidationViolation {
                field: "occurrence_id".to_string(),
                code: "NON_POSITIVE_ID".to_string(),
                message: format!("课次 id 必须为正, 实际 {}", occurrence_id),
            });
        } else {
            match self.occurrence_repo.find_by_id(occurrence_id)? {
                None => violations.push(ValidationViolation {
                    field: "occurrence_id".to_string(),
                    code: "MISSING_ROW".to_string(),
                    message: format!("课次 {} 不存在", occurrence_id),
                }),
                Some(target) => {
                    // === 结构性校验: 内嵌资源 id ===
                    for (field, id) in [
                        ("room_id", target.room_id),
                        ("course_id", target.course_id),
                        ("group_id", target.group_id),
                        ("teacher_id", target.teacher_id),
                    ] {
                        if id <= 0 {
                            violations.push(ValidationViolation {
                                field: field.to_string(),
                                code: "NON_POSITIVE_ID".to_string(),
                                message: format!("课次 {} 的 {} 非正: {}", occurrence_id, field, id),
                            });
                        }
                    }

                    // === 引擎复核项: 声明的模板必须可解析 ===
                    if let Some(pattern_id) = target.pattern_id {
                        if self.pattern_repo.find_by_id(pattern_id)?.is_none() {
                            violations.push(ValidationViolation {
                                field: "pattern_id".to_string(),
                                code: "UNRESOLVED_PATTERN".to_string(),
                                message: format!(
                                    "课次 {} 声明的模板 {} 不存在",
                                    occurrence_id, pattern_id
                                ),
                            });
                        }
                    }
                }
            }
        }

        // === 引擎复核项: 目标日期与槽位 ===
        if !calendar.is_semester_date(target_date) {
            violations.push(ValidationViolation {
                field: "target_date".to_string(),
                code: "OUT_OF_SEMESTER".to_string(),
                message: format!(
                    "目标日期 {} 不在学期 {} ~ {} 内",
                    target_date,
                    calendar.semester_start(),
                    calendar.semester_end()
                ),
            });
        }
        if target_date.weekday() != option.weekday {
            violations.push(ValidationViolation {
                field: "target_date".to_string(),
                code: "WEEKDAY_MISMATCH".to_string(),
                message: format!(
                    "目标日期 {} 是{}, 槽位要求{}",
                    target_date,
                    weekday_zh(target_date.weekday()),
                    weekday_zh(option.weekday)
                ),
            });
        }

        self.apply_mode(violations, mode)
    }

    /// 按模式裁决违规清单
    fn apply_mode(
        &self,
        violations: Vec<ValidationViolation>,
        mode: ValidationMode,
    ) -> ApiResult<Vec<ValidationViolation>> {
        if violations.is_empty() {
            return Ok(Vec::new());
        }
        match mode {
            ValidationMode::Strict => Err(ApiError::ValidationFailed {
                reason: format!("{}项校验未通过", violations.len()),
                violations,
            }),
            ValidationMode::Lenient => {
                let structural: Vec<ValidationViolation> = violations
                    .iter()
                    .filter(|v| Self::is_structural(v))
                    .cloned()
                    .collect();
                if !structural.is_empty() {
                    return Err(ApiError::ValidationFailed {
                        reason: format!("{}项结构性校验未通过", structural.len()),
                        violations: structural,
                    });
                }
                for violation in &violations {
                    warn!(
                        field = %violation.field,
                        code = %violation.code,
                        "宽松模式: 违规降级为警告 ({})",
                        violation.message
                    );
                }
                Ok(violations)
            }
        }
    }

    /// 结构性违规: 引擎无法兜底, 任何模式下都失败
    fn is_structural(violation: &ValidationViolation) -> bool {
        matches!(
            violation.code.as_str(),
            "NON_POSITIVE_ID" | "MISSING_ROW"
        )
    }
}
