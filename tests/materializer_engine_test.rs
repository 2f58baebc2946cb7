// ==========================================
// 物化引擎集成测试
// ==========================================
// 测试目标: 验证 "读时物化" 的补齐、幂等与日期归属规则
// ==========================================

mod helpers;

use chrono::Weekday;

use campus_timetable::domain::types::{Period, WeekParity};
use campus_timetable::logging;
use helpers::test_data_builder::PatternBuilder;
use test_helpers::*;

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_day_read_materializes_matching_patterns() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    // 单周周一两个模板 + 双周周一一个模板
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
    let p2 = state
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
                .parity(WeekParity::Even)
                .room(base.rooms[2])
                .course(base.courses[2])
                .group(base.groups[0])
                .teacher(base.teachers[0])
                .build(),
        )
        .expect("插入模板失败");

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");

    // 2020-09-07: 第1周 (单周) 周一
    let monday = date(2020, 9, 7);
    let lessons = materializer
        .occurrences_for_date(monday)
        .expect("单日物化失败");

    assert_eq!(lessons.len(), 2, "单周周一应物化两节课");
    // 按节次排序
    assert_eq!(lessons[0].period, Period::First);
    assert_eq!(lessons[0].pattern_id, Some(p1));
    assert_eq!(lessons[1].period, Period::Second);
    assert_eq!(lessons[1].pattern_id, Some(p2));
    for lesson in &lessons {
        assert!(lesson.occurrence_id.is_some(), "物化结果必须已入库");
        assert_eq!(lesson.lesson_date, monday);
        assert_eq!(lesson.weekday, Weekday::Mon);
    }

    // 持久层确实只有这两行
    let persisted = state
        .occurrence_repo
        .find_materialized_by_date(monday)
        .expect("查询已物化课次失败");
    assert_eq!(persisted.len(), 2);
}

#[test]
fn test_day_read_is_idempotent() {
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

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");
    let monday = date(2020, 9, 7);

    let first = materializer
        .occurrences_for_date(monday)
        .expect("第一次物化失败");
    let second = materializer
        .occurrences_for_date(monday)
        .expect("第二次物化失败");

    // 第二次读取返回同一批行, 不重复生成
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].occurrence_id, second[0].occurrence_id);

    let persisted = state
        .occurrence_repo
        .find_materialized_by_date(monday)
        .expect("查询已物化课次失败");
    assert_eq!(persisted.len(), 1, "重复读取不得产生重复行");
}

#[test]
fn test_even_week_read_picks_even_patterns() {
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
    let p_even = state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .parity(WeekParity::Even)
                .room(base.rooms[1])
                .course(base.courses[1])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");

    // 2020-09-14: 第2周 (双周) 周一 → 只出双周模板
    let lessons = materializer
        .occurrences_for_date(date(2020, 9, 14))
        .expect("单日物化失败");
    assert_eq!(lessons.len(), 1);
    assert_eq!(lessons[0].pattern_id, Some(p_even));
}

#[test]
fn test_weekend_and_off_semester_dates_yield_nothing() {
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

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");

    // 学期内周六 / 开学前 / 放假后
    for off_day in [date(2020, 9, 12), date(2020, 9, 5), date(2021, 1, 4)] {
        let lessons = materializer
            .occurrences_for_date(off_day)
            .expect("单日物化失败");
        assert!(lessons.is_empty(), "{} 不是教学日, 不应有课", off_day);

        let persisted = state
            .occurrence_repo
            .find_materialized_by_date(off_day)
            .expect("查询已物化课次失败");
        assert!(persisted.is_empty(), "{} 不应落库任何课次", off_day);
    }
}

#[test]
fn test_week_read_covers_monday_to_friday() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    // 单周的周一和周五各一节
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
                .weekday(Weekday::Fri)
                .period(Period::Fourth)
                .room(base.rooms[1])
                .course(base.courses[1])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");

    // 第1周 (单周): 周一 + 周五
    let week1 = materializer.occurrences_for_week(1).expect("整周物化失败");
    assert_eq!(week1.len(), 2);
    assert_eq!(week1[0].lesson_date, date(2020, 9, 7));
    assert_eq!(week1[1].lesson_date, date(2020, 9, 11));

    // 第2周 (双周): 两个模板都不命中
    let week2 = materializer.occurrences_for_week(2).expect("整周物化失败");
    assert!(week2.is_empty());

    // 越界周序号直接给空
    let week99 = materializer.occurrences_for_week(99).expect("整周物化失败");
    assert!(week99.is_empty());
}

#[test]
fn test_range_read_spans_weeks_in_date_order() {
    logging::init_test();
    let (_tmp, state) = create_test_state().expect("创建测试环境失败");
    seed_semester(&state).expect("写入学期失败");
    let base = seed_base_entities(&state).expect("装填基础数据失败");

    let p_odd = state
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
    let p_even = state
        .pattern_repo
        .insert(
            &PatternBuilder::new()
                .parity(WeekParity::Even)
                .room(base.rooms[1])
                .course(base.courses[1])
                .group(base.groups[1])
                .teacher(base.teachers[1])
                .build(),
        )
        .expect("插入模板失败");

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");

    // 覆盖第1周到第2周: 单周模板出 09-07, 双周模板出 09-14
    let lessons = materializer
        .occurrences_in_range(date(2020, 9, 7), date(2020, 9, 18))
        .expect("区间物化失败");
    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0].lesson_date, date(2020, 9, 7));
    assert_eq!(lessons[0].pattern_id, Some(p_odd));
    assert_eq!(lessons[1].lesson_date, date(2020, 9, 14));
    assert_eq!(lessons[1].pattern_id, Some(p_even));
}

#[test]
fn test_month_read_follows_parity_alternation() {
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

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");

    // 2020年9月的周一: 09-07(第1周,单) 09-14(第2周,双) 09-21(第3周,单) 09-28(第4周,双)
    let lessons = materializer
        .occurrences_for_month(2020, 9)
        .expect("整月物化失败");
    let dates: Vec<_> = lessons.iter().map(|o| o.lesson_date).collect();
    assert_eq!(dates, vec![date(2020, 9, 7), date(2020, 9, 21)]);
}

#[test]
fn test_vacated_date_refills_from_pattern() {
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

    let (materializer, _, _) = build_engines(&state).expect("组装引擎失败");
    let monday = date(2020, 9, 7);

    // 先物化, 再把这节课挪到周三 (模拟单次调课后的占用状态)
    let mut moved = materializer
        .occurrences_for_date(monday)
        .expect("单日物化失败")
        .remove(0);
    let moved_id = moved.occurrence_id;
    moved.lesson_date = date(2020, 9, 9);
    moved.weekday = Weekday::Wed;
    state.occurrence_repo.update(&moved).expect("更新课次失败");

    // 原日期的缺口在下次读取时重新补齐, 且是新生成的行
    let refilled = materializer
        .occurrences_for_date(monday)
        .expect("单日物化失败");
    assert_eq!(refilled.len(), 1);
    assert_ne!(refilled[0].occurrence_id, moved_id, "补齐的是新行, 不是挪走的旧行");
    assert_eq!(refilled[0].lesson_date, monday);

    // 挪走的行停在周三
    let wednesday = materializer
        .occurrences_for_date(date(2020, 9, 9))
        .expect("单日物化失败");
    assert_eq!(wednesday.len(), 1);
    assert_eq!(wednesday[0].occurrence_id, moved_id);
}
