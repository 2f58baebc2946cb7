// ==========================================
// 调课 API 集成测试
// ==========================================
// 测试目标: 校验模式、审计日志、错误映射与视图组装
// ==========================================

mod helpers;

use campus_timetable::api::{ApiError, ValidationMode};
use campus_timetable::app::AppState;
use campus_timetable::domain::types::WeekParity;
use campus_timetable::logging;
use helpers::test_data_builder::PatternBuilder;
use tempfile::NamedTempFile;
use test_helpers::*;

// ==========================================
// 测试辅助函数
// ==========================================

/// 建好学期 + 基础数据 + 槽位目录 + 一个单周周一模板, 返回目标课次ID
fn setup_with_target(state: &AppState) -> (BaseData, i64, i64) {
    seed_semester(state).expect("写入学期失败");
    let base = seed_base_entities(state).expect("装填基础数据失败");
    seed_option_grid(state, &base.rooms[..2]).expect("装填槽位目录失败");

    let pattern_id = state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .room(base.rooms[0])
                .course(base.courses[0])
                .group(base.groups[0])
                .teacher(base.teachers[0])
                .build(),
        )
        .expect("插入模板失败");

    let timetable = state.timetable_api().expect("组装课表 API 失败");
    let day = timetable.day_view(date(2020, 9, 7)).expect("单日视图失败");
    assert_eq!(day.len(), 1);
    (base, day[0].occurrence_id, pattern_id)
}

fn fresh_state() -> (NamedTempFile, AppState) {
    create_test_state().expect("创建测试环境失败")
}

// ==========================================
// 单次调课 + 审计
// ==========================================

#[test]
fn test_reschedule_once_returns_view_and_audits() {
    logging::init_test();
    let (_tmp, state) = fresh_state();
    let (base, occurrence_id, pattern_id) = setup_with_target(&state);

    let api = state.reschedule_api().expect("组装调课 API 失败");

    // 候选里选 周三第二节 A-02
    let wednesday = date(2020, 9, 9);
    let options = api
        .options_for_date(occurrence_id, wednesday)
        .expect("查询候选失败");
    let picked = options
        .iter()
        .find(|o| o.weekday == "WEDNESDAY" && o.period == "SECOND" && o.room_id == base.rooms[1])
        .expect("目录缺少预期槽位");

    let view = api
        .reschedule_once(occurrence_id, wednesday, picked.option_id)
        .expect("单次调课失败");

    // 视图字段齐全且带名称
    assert_eq!(view.occurrence_id, occurrence_id);
    assert_eq!(view.lesson_date, wednesday);
    assert_eq!(view.weekday, "WEDNESDAY");
    assert_eq!(view.period, "SECOND");
    assert_eq!(view.room_no, "A-02");
    assert_eq!(view.course_name, "高等数学");
    assert_eq!(view.group_name, "计算机2001班");
    assert_eq!(view.teacher_name, "张老师");
    assert_eq!(view.pattern_id, Some(pattern_id));

    // 审计: 恰好一条, 操作人/类型/目标齐全
    let logs = state
        .action_log_repo
        .find_recent(10)
        .expect("查询日志失败");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, "RescheduleOnce");
    assert_eq!(logs[0].actor, "admin");
    assert_eq!(logs[0].occurrence_id, Some(occurrence_id));
    assert_eq!(logs[0].affected_count, 1);
    assert!(logs[0].detail.is_some());
}

#[test]
fn test_failed_reschedule_writes_no_audit() {
    logging::init_test();
    let (_tmp, state) = fresh_state();
    let (base, occurrence_id, _) = setup_with_target(&state);

    // 周三第一节 A-02 被另一批师生占住
    state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .weekday(chrono::Weekday::Wed)
                .room(base.rooms[1])
                .course(base.courses[1])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");

    let api = state.reschedule_api().expect("组装调课 API 失败");
    let occupied = find_option(
        &state,
        chrono::Weekday::Wed,
        campus_timetable::Period::First,
        base.rooms[1],
    )
    .expect("目录缺少槽位");

    let err = api
        .reschedule_once(occurrence_id, date(2020, 9, 9), occupied.option_id)
        .expect_err("被占槽位应拒绝");
    assert!(matches!(err, ApiError::Conflict(_)), "{:?}", err);

    // 失败的操作不留审计
    let logs = state
        .action_log_repo
        .find_recent(10)
        .expect("查询日志失败");
    assert!(logs.is_empty());
}

#[test]
fn test_unknown_option_id_is_not_found() {
    logging::init_test();
    let (_tmp, state) = fresh_state();
    let (_, occurrence_id, _) = setup_with_target(&state);

    let api = state.reschedule_api().expect("组装调课 API 失败");
    let err = api
        .reschedule_once(occurrence_id, date(2020, 9, 9), 99999)
        .expect_err("不存在的槽位应报错");
    assert!(matches!(err, ApiError::NotFound(_)), "{:?}", err);
}

// ==========================================
// 校验模式
// ==========================================

#[test]
fn test_strict_mode_rejects_weekday_mismatch_before_engine() {
    logging::init_test();
    let (_tmp, state) = fresh_state();
    let (base, occurrence_id, _) = setup_with_target(&state);

    // 缺省即严格模式
    assert_eq!(
        state.config.get_validation_mode().expect("读取校验模式失败"),
        ValidationMode::Strict
    );

    let api = state.reschedule_api().expect("组装调课 API 失败");
    // 周二的槽位配周三的日期
    let tue_option = find_option(
        &state,
        chrono::Weekday::Tue,
        campus_timetable::Period::First,
        base.rooms[1],
    )
    .expect("目录缺少槽位");

    let err = api
        .reschedule_once(occurrence_id, date(2020, 9, 9), tue_option.option_id)
        .expect_err("严格模式应拦截");
    match err {
        ApiError::ValidationFailed { violations, .. } => {
            assert!(violations.iter().any(|v| v.code == "WEEKDAY_MISMATCH"));
        }
        other => panic!("预期校验失败, 实际 {:?}", other),
    }
}

#[test]
fn test_lenient_mode_defers_to_engine() {
    logging::init_test();
    let (_tmp, state) = fresh_state();
    let (base, occurrence_id, _) = setup_with_target(&state);

    state
        .config
        .set_validation_mode(ValidationMode::Lenient)
        .expect("切换校验模式失败");

    let api = state.reschedule_api().expect("组装调课 API 失败");
    let tue_option = find_option(
        &state,
        chrono::Weekday::Tue,
        campus_timetable::Period::First,
        base.rooms[1],
    )
    .expect("目录缺少槽位");

    // 宽松模式放行到引擎, 引擎仍然拒绝
    let err = api
        .reschedule_once(occurrence_id, date(2020, 9, 9), tue_option.option_id)
        .expect_err("引擎应兜底拒绝");
    assert!(matches!(err, ApiError::InvalidRequest(_)), "{:?}", err);

    // 合法请求在宽松模式下照常成功
    let wed_option = find_option(
        &state,
        chrono::Weekday::Wed,
        campus_timetable::Period::Second,
        base.rooms[1],
    )
    .expect("目录缺少槽位");
    let view = api
        .reschedule_once(occurrence_id, date(2020, 9, 9), wed_option.option_id)
        .expect("合法调课失败");
    assert_eq!(view.lesson_date, date(2020, 9, 9));
}

#[test]
fn test_structural_violations_fail_even_in_lenient_mode() {
    logging::init_test();
    let (_tmp, state) = fresh_state();
    let (base, _, _) = setup_with_target(&state);

    state
        .config
        .set_validation_mode(ValidationMode::Lenient)
        .expect("切换校验模式失败");

    let api = state.reschedule_api().expect("组装调课 API 失败");
    let option = find_option(
        &state,
        chrono::Weekday::Wed,
        campus_timetable::Period::Second,
        base.rooms[1],
    )
    .expect("目录缺少槽位");

    // 课次不存在属于结构性缺陷, 宽松模式也不放行
    let err = api
        .reschedule_once(4567, date(2020, 9, 9), option.option_id)
        .expect_err("缺行应拦截");
    match err {
        ApiError::ValidationFailed { violations, .. } => {
            assert!(violations.iter().any(|v| v.code == "MISSING_ROW"));
        }
        other => panic!("预期校验失败, 实际 {:?}", other),
    }
}

// ==========================================
// 永久调课 + 审计
// ==========================================

#[test]
fn test_permanent_reschedule_summary_and_audit() {
    logging::init_test();
    let (_tmp, state) = fresh_state();
    let (base, occurrence_id, pattern_id) = setup_with_target(&state);

    // 先把第3周周一也物化出来, 级联才有两行可动
    let timetable = state.timetable_api().expect("组装课表 API 失败");
    timetable.day_view(date(2020, 9, 21)).expect("单日视图失败");

    let api = state.reschedule_api().expect("组装调课 API 失败");
    let option = find_option(
        &state,
        chrono::Weekday::Wed,
        campus_timetable::Period::Second,
        base.rooms[1],
    )
    .expect("目录缺少槽位");

    let summary = api
        .reschedule_permanently(occurrence_id, date(2020, 9, 9), option.option_id)
        .expect("永久调课失败");

    // 摘要: 模板视图 + 受影响课次
    assert_eq!(summary.pattern.pattern_id, pattern_id);
    assert_eq!(summary.pattern.week_parity, WeekParity::Odd.to_db_str());
    assert_eq!(summary.pattern.weekday, "WEDNESDAY");
    assert_eq!(summary.pattern.period, "SECOND");
    assert_eq!(summary.pattern.room_no, "A-02");
    assert_eq!(summary.affected_count, 2);
    assert_eq!(summary.moved.len(), 2);
    let dates: Vec<_> = summary.moved.iter().map(|o| o.lesson_date).collect();
    assert_eq!(dates, vec![date(2020, 9, 9), date(2020, 9, 23)]);

    // 审计: 带模板ID与受影响行数
    let logs = state
        .action_log_repo
        .find_recent(10)
        .expect("查询日志失败");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, "ReschedulePermanent");
    assert_eq!(logs[0].pattern_id, Some(pattern_id));
    assert_eq!(logs[0].occurrence_id, Some(occurrence_id));
    assert_eq!(logs[0].affected_count, 2);
}

// ==========================================
// 学期未配置
// ==========================================

#[test]
fn test_apis_require_semester_config() {
    logging::init_test();
    let (_tmp, state) = fresh_state();

    // 学期未配置时 API 组装直接失败, 提示先配置
    let err = state.reschedule_api().expect_err("应要求先配置学期");
    assert!(matches!(err, ApiError::InvalidRequest(_)), "{:?}", err);

    let err = state.timetable_api().expect_err("应要求先配置学期");
    assert!(matches!(err, ApiError::InvalidRequest(_)), "{:?}", err);
}
