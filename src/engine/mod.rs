// ==========================================
// 高校排课系统 - 引擎层
// ==========================================
// 职责: 物化 / 冲突检测 / 调课执行的业务规则
// 红线: 纯规则进 conflict_core, 编排与 I/O 进各引擎;
//       引擎只走仓储接口, 不拼 SQL
// ==========================================

pub mod conflict;
pub mod conflict_core;
pub mod error;
pub mod materializer;
pub mod reschedule;

// 重导出核心引擎
pub use conflict::ConflictEngine;
pub use conflict_core::{ConflictCore, ExemptionScope, SlotConflict};
pub use error::{EngineError, EngineResult};
pub use materializer::MaterializerEngine;
pub use reschedule::{RescheduleEngine, RescheduleOutcome};
