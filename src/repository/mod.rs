// ==========================================
// 高校排课系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod entity_repo;
pub mod error;
pub mod occurrence_repo;
pub mod option_repo;
pub mod pattern_repo;

// 节次/星期/周型在库中为文本编码,排序必须走序数映射而非字典序
pub(crate) const PERIOD_ORDER_SQL: &str = "CASE period
     WHEN 'FIRST' THEN 1 WHEN 'SECOND' THEN 2 WHEN 'THIRD' THEN 3
     WHEN 'FOURTH' THEN 4 WHEN 'FIFTH' THEN 5 ELSE 6 END";

pub(crate) const PARITY_ORDER_SQL: &str = "CASE week_parity
     WHEN 'ODD' THEN 1 WHEN 'EVEN' THEN 2 ELSE 3 END";

pub(crate) const WEEKDAY_ORDER_SQL: &str = "CASE weekday
     WHEN 'MONDAY' THEN 1 WHEN 'TUESDAY' THEN 2 WHEN 'WEDNESDAY' THEN 3
     WHEN 'THURSDAY' THEN 4 WHEN 'FRIDAY' THEN 5
     WHEN 'SATURDAY' THEN 6 ELSE 7 END";

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use entity_repo::EntityRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use occurrence_repo::OccurrenceRepository;
pub use option_repo::OptionRepository;
pub use pattern_repo::PatternRepository;
