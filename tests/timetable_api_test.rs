// ==========================================
// 课表查询 API 集成测试
// ==========================================
// 测试目标: 日/周/月视图的组装、命名与入参校验
// ==========================================

mod helpers;

use chrono::Weekday;

use campus_timetable::api::ApiError;
use campus_timetable::domain::types::{Period, WeekParity};
use campus_timetable::logging;
use helpers::test_data_builder::PatternBuilder;
use test_helpers::*;

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_day_view_carries_names_in_period_order() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    // 故意先插第二节再插第一节, 验证输出按节次排序
    state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .period(Period::Second)
                .room(base.rooms[1])
                .course(base.courses[1])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");
    state
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

    let api = state.timetable_api().expect("组装课表 API 失败");
    let day = api.day_view(date(2020, 9, 7)).expect("单日视图失败");

    assert_eq!(day.len(), 2);
    assert_eq!(day[0].period, "FIRST");
    assert_eq!(day[0].course_name, "高等数学");
    assert_eq!(day[0].room_no, "A-01");
    assert_eq!(day[0].teacher_name, "张老师");
    assert_eq!(day[1].period, "SECOND");
    assert_eq!(day[1].course_name, "大学英语");
    assert_eq!(day[1].group_name, "软件2001班");
}

#[test]
fn test_week_view_buckets_monday_to_friday() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    state
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
    state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .weekday(Weekday::Thu)
                .period(Period::Third)
                .room(base.rooms[1])
                .course(base.courses[1])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");

    let api = state.timetable_api().expect("组装课表 API 失败");
    let week = api.week_view(1).expect("整周视图失败");

    assert_eq!(week.week_no, 1);
    assert_eq!(week.week_parity, WeekParity::Odd.to_db_str());
    assert_eq!(week.monday, date(2020, 9, 7));
    assert_eq!(week.friday, date(2020, 9, 11));
    assert_eq!(week.days.len(), 5);

    // 日桶按日期递增, 星期标注齐全
    let weekdays: Vec<&str> = week.days.iter().map(|d| d.weekday.as_str()).collect();
    assert_eq!(
        weekdays,
        vec!["MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY"]
    );

    // 课落在对应的桶里
    assert_eq!(week.days[0].lessons.len(), 1);
    assert_eq!(week.days[0].lessons[0].course_name, "高等数学");
    assert_eq!(week.days[3].lessons.len(), 1);
    assert_eq!(week.days[3].lessons[0].period, "THIRD");
    assert!(week.days[1].lessons.is_empty());
    assert!(week.days[2].lessons.is_empty());
    assert!(week.days[4].lessons.is_empty());

    // 第二周 (双周) 没有单周模板的课
    let week2 = api.week_view(2).expect("整周视图失败");
    assert_eq!(week2.week_parity, WeekParity::Even.to_db_str());
    assert!(week2.days.iter().all(|d| d.lessons.is_empty()));
}

#[test]
fn test_week_view_rejects_out_of_range_week() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    seed_base_entities(&state).expect("装填基础数据失败");

    let api = state.timetable_api().expect("组装课表 API 失败");

    // 14 周学期: 0 和 15 都越界
    for bad_week in [0, 15, 99] {
        let err = api.week_view(bad_week).expect_err("越界周序号应拒绝");
        assert!(matches!(err, ApiError::InvalidRequest(_)), "{:?}", err);
    }
}

#[test]
fn test_month_view_validates_month_number() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    state
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

    let api = state.timetable_api().expect("组装课表 API 失败");

    let err = api.month_view(2020, 13).expect_err("非法月份应拒绝");
    assert!(matches!(err, ApiError::InvalidRequest(_)), "{:?}", err);

    // 9月的单周周一: 09-07 与 09-21
    let september = api.month_view(2020, 9).expect("整月视图失败");
    let dates: Vec<_> = september.iter().map(|o| o.lesson_date).collect();
    assert_eq!(dates, vec![date(2020, 9, 7), date(2020, 9, 21)]);

    // 学期外的月份给空
    let may = api.month_view(2020, 5).expect("整月视图失败");
    assert!(may.is_empty());
}

#[test]
fn test_range_endpoints_validated() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    state
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

    let api = state.timetable_api().expect("组装课表 API 失败");

    let err = api
        .occurrences_in_range(date(2020, 9, 14), date(2020, 9, 7))
        .expect_err("起止颠倒应拒绝");
    assert!(matches!(err, ApiError::InvalidRequest(_)), "{:?}", err);

    let lessons = api
        .occurrences_in_range(date(2020, 9, 7), date(2020, 9, 25))
        .expect("区间查询失败");
    let dates: Vec<_> = lessons.iter().map(|o| o.lesson_date).collect();
    assert_eq!(dates, vec![date(2020, 9, 7), date(2020, 9, 21)]);
}

#[test]
fn test_list_patterns_returns_catalog_views() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    state
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
    state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .parity(WeekParity::Even)
                .weekday(Weekday::Fri)
                .period(Period::Fourth)
                .room(base.rooms[1])
                .course(base.courses[2])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");

    let api = state.timetable_api().expect("组装课表 API 失败");
    let patterns = api.list_patterns().expect("模板列表失败");

    assert_eq!(patterns.len(), 2);
    // 目录序: 单周在前
    assert_eq!(patterns[0].week_parity, "ODD");
    assert_eq!(patterns[0].course_name, "高等数学");
    assert_eq!(patterns[1].week_parity, "EVEN");
    assert_eq!(patterns[1].weekday, "FRIDAY");
    assert_eq!(patterns[1].room_no, "A-02");
    assert_eq!(patterns[1].course_name, "数据结构");
}
