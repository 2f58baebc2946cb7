// ==========================================
// 调课引擎集成测试
// ==========================================
// 测试目标: 验证单次调课的例外语义与永久调课的级联改写
// ==========================================

mod helpers;

use chrono::Weekday;

use campus_timetable::domain::lesson::LessonOccurrence;
use campus_timetable::domain::types::{Period, WeekParity};
use campus_timetable::engine::EngineError;
use campus_timetable::logging;
use helpers::test_data_builder::PatternBuilder;
use test_helpers::*;

// ==========================================
// 单次调课
// ==========================================

#[test]
fn test_reschedule_once_moves_only_that_lesson() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

    let p1 = state
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

    let (materializer, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let monday = date(2020, 9, 7);
    let target = materializer
        .occurrences_for_date(monday)
        .expect("单日物化失败")
        .remove(0);
    let target_id = target.occurrence_id.expect("课次应已入库");

    // 挪到同周周三第二节 A-02
    let wednesday = date(2020, 9, 9);
    let option = find_option(&state, Weekday::Wed, Period::Second, base.rooms[1])
        .expect("目录缺少槽位");
    let moved = reschedule
        .reschedule_once(target_id, wednesday, &option)
        .expect("单次调课失败");

    // 被移动的课次: 新日期新槽位, 出处模板保留
    assert_eq!(moved.occurrence_id, Some(target_id));
    assert_eq!(moved.lesson_date, wednesday);
    assert_eq!(moved.weekday, Weekday::Wed);
    assert_eq!(moved.period, Period::Second);
    assert_eq!(moved.room_id, base.rooms[1]);
    assert_eq!(moved.pattern_id, Some(p1));

    // 模板本身纹丝不动
    let pattern = state
        .pattern_repo
        .find_by_id(p1)
        .expect("查询模板失败")
        .expect("模板应存在");
    assert_eq!(pattern.weekday, Weekday::Mon);
    assert_eq!(pattern.period, Period::First);
    assert_eq!(pattern.room_id, base.rooms[0]);

    // 原日期重新物化出一节新课 (挪走的课把周期槽位腾了出来)
    let refilled = materializer
        .occurrences_for_date(monday)
        .expect("单日物化失败");
    assert_eq!(refilled.len(), 1);
    assert_ne!(refilled[0].occurrence_id, Some(target_id));
    assert_eq!(refilled[0].room_id, base.rooms[0]);
    assert_eq!(refilled[0].period, Period::First);

    // 新日期上只有挪来的这节课
    let at_new_date = materializer
        .occurrences_for_date(wednesday)
        .expect("单日物化失败");
    assert_eq!(at_new_date.len(), 1);
    assert_eq!(at_new_date[0].occurrence_id, Some(target_id));
}

#[test]
fn test_reschedule_once_rejects_weekday_mismatch() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

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

    let (materializer, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let target = materializer
        .occurrences_for_date(date(2020, 9, 7))
        .expect("单日物化失败")
        .remove(0);
    let target_id = target.occurrence_id.expect("课次应已入库");

    // 周二的槽位配周三的日期
    let tue_option = find_option(&state, Weekday::Tue, Period::First, base.rooms[1])
        .expect("目录缺少槽位");
    let err = reschedule
        .reschedule_once(target_id, date(2020, 9, 9), &tue_option)
        .expect_err("星期不匹配应拒绝");
    assert!(matches!(err, EngineError::InvalidRequest(_)), "{:?}", err);
}

#[test]
fn test_reschedule_once_rejects_off_semester_date() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

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

    let (materializer, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let target = materializer
        .occurrences_for_date(date(2020, 9, 7))
        .expect("单日物化失败")
        .remove(0);
    let target_id = target.occurrence_id.expect("课次应已入库");

    // 2021-01-04 是周一, 但已在学期外
    let mon_option = find_option(&state, Weekday::Mon, Period::Second, base.rooms[1])
        .expect("目录缺少槽位");
    let err = reschedule
        .reschedule_once(target_id, date(2021, 1, 4), &mon_option)
        .expect_err("学期外日期应拒绝");
    assert!(matches!(err, EngineError::InvalidRequest(_)), "{:?}", err);
}

#[test]
fn test_reschedule_once_rejects_occupied_slot() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

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
    // 另一批师生周三第一节在 A-02 有课
    state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .weekday(Weekday::Wed)
                .room(base.rooms[1])
                .course(base.courses[1])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");

    let (materializer, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let target = materializer
        .occurrences_for_date(date(2020, 9, 7))
        .expect("单日物化失败")
        .remove(0);
    let target_id = target.occurrence_id.expect("课次应已入库");

    let occupied = find_option(&state, Weekday::Wed, Period::First, base.rooms[1])
        .expect("目录缺少槽位");
    let err = reschedule
        .reschedule_once(target_id, date(2020, 9, 9), &occupied)
        .expect_err("被占槽位应拒绝");
    assert!(matches!(err, EngineError::Conflict(_)), "{:?}", err);

    // 拒绝后原课次原地不动
    let unchanged = state
        .occurrence_repo
        .find_by_id(target_id)
        .expect("查询课次失败")
        .expect("课次应存在");
    assert_eq!(unchanged.lesson_date, date(2020, 9, 7));
    assert_eq!(unchanged.period, Period::First);
}

#[test]
fn test_reschedule_once_missing_occurrence() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

    let (_, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let option = find_option(&state, Weekday::Mon, Period::First, base.rooms[0])
        .expect("目录缺少槽位");

    let err = reschedule
        .reschedule_once(9999, date(2020, 9, 7), &option)
        .expect_err("不存在的课次应报错");
    assert!(matches!(err, EngineError::NotFound { .. }), "{:?}", err);
}

// ==========================================
// 永久调课
// ==========================================

#[test]
fn test_reschedule_permanently_rewrites_pattern_and_all_instances() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

    let p1 = state
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

    let (materializer, _, reschedule) = build_engines(&state).expect("组装引擎失败");

    // 第1周和第3周的周一先后物化
    let target = materializer
        .occurrences_for_date(date(2020, 9, 7))
        .expect("单日物化失败")
        .remove(0);
    materializer
        .occurrences_for_date(date(2020, 9, 21))
        .expect("单日物化失败");
    let target_id = target.occurrence_id.expect("课次应已入库");

    // 周一第一节 A-01 → 周三第二节 A-02, 从第1周周三生效 (同为单周)
    let option = find_option(&state, Weekday::Wed, Period::Second, base.rooms[1])
        .expect("目录缺少槽位");
    let outcome = reschedule
        .reschedule_permanently(target_id, date(2020, 9, 9), &option)
        .expect("永久调课失败");

    // 模板改写到新槽位, 单双周保持单周
    assert_eq!(outcome.pattern.pattern_id, Some(p1));
    assert_eq!(outcome.pattern.week_parity, WeekParity::Odd);
    assert_eq!(outcome.pattern.weekday, Weekday::Wed);
    assert_eq!(outcome.pattern.period, Period::Second);
    assert_eq!(outcome.pattern.room_id, base.rooms[1]);

    // 级联: 两节已物化课次都平移两天并落到新槽位
    assert_eq!(outcome.moved.len(), 2);
    let dates: Vec<_> = outcome.moved.iter().map(|o| o.lesson_date).collect();
    assert_eq!(dates, vec![date(2020, 9, 9), date(2020, 9, 23)]);
    for moved in &outcome.moved {
        assert_eq!(moved.weekday, Weekday::Wed);
        assert_eq!(moved.period, Period::Second);
        assert_eq!(moved.room_id, base.rooms[1]);
        assert_eq!(moved.pattern_id, Some(p1));
    }

    // 原周一不再产生课: 模板已不认周一
    let monday_after = materializer
        .occurrences_for_date(date(2020, 9, 7))
        .expect("单日物化失败");
    assert!(monday_after.is_empty());

    // 未来的单周周三按新槽位物化
    let future = materializer
        .occurrences_for_date(date(2020, 10, 7))
        .expect("单日物化失败");
    assert_eq!(future.len(), 1);
    assert_eq!(future[0].period, Period::Second);
    assert_eq!(future[0].room_id, base.rooms[1]);
}

#[test]
fn test_reschedule_permanently_switches_parity() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

    let p1 = state
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

    let (materializer, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let target = materializer
        .occurrences_for_date(date(2020, 9, 7))
        .expect("单日物化失败")
        .remove(0);
    let target_id = target.occurrence_id.expect("课次应已入库");

    // 生效日期落在第2周 (双周) 周三 → 模板翻到双周
    let option = find_option(&state, Weekday::Wed, Period::First, base.rooms[0])
        .expect("目录缺少槽位");
    let outcome = reschedule
        .reschedule_permanently(target_id, date(2020, 9, 16), &option)
        .expect("永久调课失败");

    assert_eq!(outcome.pattern.week_parity, WeekParity::Even);
    assert_eq!(outcome.pattern.weekday, Weekday::Wed);

    // 级联只按星期差平移既有行 (周一+2天=周三), 不跨周搬运
    assert_eq!(outcome.moved.len(), 1);
    assert_eq!(outcome.moved[0].lesson_date, date(2020, 9, 9));

    // 双周周三从模板新生课次, 单周周三只有级联来的例外行
    let even_wed = materializer
        .occurrences_for_date(date(2020, 9, 16))
        .expect("单日物化失败");
    assert_eq!(even_wed.len(), 1);
    assert_eq!(even_wed[0].pattern_id, Some(p1));
    assert_ne!(even_wed[0].occurrence_id, Some(target_id));

    let odd_wed = materializer
        .occurrences_for_date(date(2020, 9, 9))
        .expect("单日物化失败");
    assert_eq!(odd_wed.len(), 1);
    assert_eq!(odd_wed[0].occurrence_id, Some(target_id));
}

#[test]
fn test_reschedule_permanently_rejects_detached_occurrence() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

    // 手工插入一节不挂模板的独立课次
    let detached_id = state
        .occurrence_repo
        .insert(&LessonOccurrence {
            occurrence_id: None,
            pattern_id: None,
            lesson_date: date(2020, 9, 7),
            weekday: Weekday::Mon,
            period: Period::Fifth,
            room_id: base.rooms[2],
            course_id: base.courses[2],
            group_id: base.groups[1],
            teacher_id: base.teachers[1],
        })
        .expect("插入课次失败");

    let (_, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let option = find_option(&state, Weekday::Wed, Period::First, base.rooms[0])
        .expect("目录缺少槽位");

    let err = reschedule
        .reschedule_permanently(detached_id, date(2020, 9, 9), &option)
        .expect_err("独立课次无模板可改");
    assert!(matches!(err, EngineError::InconsistentState(_)), "{:?}", err);
}

#[test]
fn test_cascade_collision_with_existing_exception() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");
    seed_option_grid(&state, &base.rooms[..2]).expect("装填槽位目录失败");

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

    let (materializer, _, reschedule) = build_engines(&state).expect("组装引擎失败");
    let target = materializer
        .occurrences_for_date(date(2020, 9, 7))
        .expect("单日物化失败")
        .remove(0);
    materializer
        .occurrences_for_date(date(2020, 9, 21))
        .expect("单日物化失败");
    let target_id = target.occurrence_id.expect("课次应已入库");

    // 级联落点 (09-23 第二节 A-02) 已被一节独立课次占住;
    // 生效日 09-09 本身是干净的, 提交前复核看不见这颗雷
    state
        .occurrence_repo
        .insert(&LessonOccurrence {
            occurrence_id: None,
            pattern_id: None,
            lesson_date: date(2020, 9, 23),
            weekday: Weekday::Wed,
            period: Period::Second,
            room_id: base.rooms[1],
            course_id: base.courses[1],
            group_id: base.groups[1],
            teacher_id: base.teachers[1],
        })
        .expect("插入课次失败");

    let option = find_option(&state, Weekday::Wed, Period::Second, base.rooms[1])
        .expect("目录缺少槽位");
    let err = reschedule
        .reschedule_permanently(target_id, date(2020, 9, 9), &option)
        .expect_err("级联撞车应报冲突");
    assert!(matches!(err, EngineError::Conflict(_)), "{:?}", err);

    // 级联是全量回滚的: 两节课次仍停在原位
    let rows = state
        .occurrence_repo
        .find_by_pattern_id(
            target.pattern_id.expect("目标课次应挂模板"),
        )
        .expect("查询课次失败");
    let dates: Vec<_> = rows.iter().map(|o| o.lesson_date).collect();
    assert_eq!(dates, vec![date(2020, 9, 7), date(2020, 9, 21)]);
}
