// ==========================================
// 高校排课系统 - 应用状态
// ==========================================
// 职责: 管理共享连接、仓储与API实例的装配
// 红线: 全系统共用一条 SQLite 连接 (Arc<Mutex>), 仓储一律挂到它上面
// ==========================================
// 说明: 仓储与配置在启动时装配; 引擎和 API 依赖学期日历,
// 而日历来自配置表, 所以按需装配 — 学期未配置时
// init/semester/log 等命令仍可工作
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::error::ApiResult;
use crate::api::reschedule_api::RescheduleApi;
use crate::api::timetable_api::TimetableApi;
use crate::api::validator::RescheduleValidator;
use crate::config::config_manager::ConfigManager;
use crate::db::open_and_init;
use crate::domain::calendar::SemesterCalendar;
use crate::engine::conflict::ConflictEngine;
use crate::engine::materializer::MaterializerEngine;
use crate::engine::reschedule::RescheduleEngine;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::entity_repo::EntityRepository;
use crate::repository::occurrence_repo::OccurrenceRepository;
use crate::repository::option_repo::OptionRepository;
use crate::repository::pattern_repo::PatternRepository;

/// 应用状态
///
/// 持有共享连接上的全部仓储与配置管理器
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 排课模板仓储
    pub pattern_repo: Arc<PatternRepository>,

    /// 课次仓储
    pub occurrence_repo: Arc<OccurrenceRepository>,

    /// 候选槽位目录
    pub option_repo: Arc<OptionRepository>,

    /// 基础资源仓储
    pub entity_repo: Arc<EntityRepository>,

    /// 调课日志仓储
    pub action_log_repo: Arc<ActionLogRepository>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 该方法会:
    /// 1. 打开数据库并执行建表脚本 (幂等)
    /// 2. 在共享连接上装配全部仓储
    /// 3. 装配配置管理器
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState,数据库路径: {}", db_path);

        let conn = open_and_init(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let pattern_repo = Arc::new(PatternRepository::from_connection(conn.clone()));
        let occurrence_repo = Arc::new(OccurrenceRepository::from_connection(conn.clone()));
        let option_repo = Arc::new(OptionRepository::from_connection(conn.clone()));
        let entity_repo = Arc::new(EntityRepository::from_connection(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            pattern_repo,
            occurrence_repo,
            option_repo,
            entity_repo,
            action_log_repo,
            config,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }

    /// 从配置装配学期日历
    pub fn semester_calendar(&self) -> ApiResult<SemesterCalendar> {
        Ok(self.config.get_semester_calendar()?)
    }

    /// 装配课表查询 API (要求学期已配置)
    pub fn timetable_api(&self) -> ApiResult<TimetableApi> {
        let calendar = self.semester_calendar()?;
        let materializer = Arc::new(MaterializerEngine::new(
            calendar,
            self.pattern_repo.clone(),
            self.occurrence_repo.clone(),
        ));
        Ok(TimetableApi::new(
            calendar,
            materializer,
            self.pattern_repo.clone(),
            self.entity_repo.clone(),
        ))
    }

    /// 装配调课 API (要求学期已配置)
    pub fn reschedule_api(&self) -> ApiResult<RescheduleApi> {
        let calendar = self.semester_calendar()?;
        let materializer = Arc::new(MaterializerEngine::new(
            calendar,
            self.pattern_repo.clone(),
            self.occurrence_repo.clone(),
        ));
        let conflict_engine = Arc::new(ConflictEngine::new(
            calendar,
            materializer,
            self.pattern_repo.clone(),
            self.option_repo.clone(),
        ));
        let reschedule_engine = Arc::new(RescheduleEngine::new(
            calendar,
            conflict_engine.clone(),
            self.pattern_repo.clone(),
            self.occurrence_repo.clone(),
        ));
        let validator = Arc::new(RescheduleValidator::new(
            self.occurrence_repo.clone(),
            self.pattern_repo.clone(),
        ));
        Ok(RescheduleApi::new(
            calendar,
            conflict_engine,
            reschedule_engine,
            self.occurrence_repo.clone(),
            self.option_repo.clone(),
            self.entity_repo.clone(),
            self.action_log_repo.clone(),
            validator,
            self.config.clone(),
        ))
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 CAMPUS_TIMETABLE_DB_PATH 优先 (便于调试/测试/CI)
/// - 开发环境: 用户数据目录/campus-timetable-dev/campus_timetable.db
/// - 生产环境: 用户数据目录/campus-timetable/campus_timetable.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("CAMPUS_TIMETABLE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值,后续如果能拿到 data_dir 再覆盖
    let mut path = PathBuf::from("./campus_timetable.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录,避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("campus-timetable-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("campus-timetable");
        }

        std::fs::create_dir_all(&path).ok();
        path = path.join("campus_timetable.db");
    }

    path.to_string_lossy().to_string()
}
