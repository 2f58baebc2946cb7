// ==========================================
// 高校排课系统 - 示例课表装填工具
// ==========================================
// 用途: 重置数据库并装填一套可演示的学期课表
// 学期: 2025-09-08 ~ 2026-01-16, 模板覆盖单双周
// ==========================================

use anyhow::{anyhow, Result};
use chrono::{NaiveDate, Weekday};
use std::fs;
use std::path::Path;

use campus_timetable::app::{get_default_db_path, AppState};
use campus_timetable::domain::lesson::LessonPattern;
use campus_timetable::domain::types::{Period, WeekParity, TEACHING_WEEKDAYS};

const SEMESTER_START: &str = "2025-09-08";
const SEMESTER_END: &str = "2026-01-16";

fn main() -> Result<()> {
    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    backup_and_reset_db(&db_path)?;

    // AppState::new 会建库建表 (幂等)
    let state = AppState::new(db_path.clone()).map_err(|e| anyhow!(e))?;

    // === 学期边界 ===
    let start = NaiveDate::parse_from_str(SEMESTER_START, "%Y-%m-%d")?;
    let end = NaiveDate::parse_from_str(SEMESTER_END, "%Y-%m-%d")?;
    state.config.set_semester(start, end)?;
    let calendar = state.semester_calendar()?;
    println!(
        "学期: {} ~ {} (共 {} 周)",
        calendar.semester_start(),
        calendar.semester_end(),
        calendar.week_count()
    );

    // === 基础资源 ===
    let rooms = seed_rooms(&state)?;
    let courses = seed_courses(&state)?;
    let teachers = seed_teachers(&state)?;
    let groups = seed_groups(&state)?;

    // === 排课模板 (覆盖单双周) ===
    let pattern_count = seed_patterns(&state, &rooms, &courses, &teachers, &groups)?;

    // === 候选槽位目录 (教学日 x 节次 x 教室 全网格) ===
    let option_count = state
        .option_repo
        .seed_grid(&rooms, &TEACHING_WEEKDAYS, &Period::ALL)?;

    println!("装填完成: {}", db_path);
    println!(
        "  教室 {} / 课程 {} / 教师 {} / 班级 {}",
        rooms.len(),
        courses.len(),
        teachers.len(),
        groups.len()
    );
    println!("  模板 {} / 候选槽位 {}", pattern_count, option_count);
    println!();
    println!("试一试:");
    println!("  campus-timetable day {}", SEMESTER_START);
    println!("  campus-timetable week 1");
    println!("  campus-timetable patterns");

    Ok(())
}

/// 既有数据库先备份再删除, 避免误覆盖演示之外的数据
fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("已备份旧数据库 {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_rooms(state: &AppState) -> Result<Vec<i64>> {
    let specs = [
        ("A-101", Some(60)),
        ("A-102", Some(60)),
        ("A-103", Some(45)),
        ("A-104", Some(45)),
        ("B-201", Some(120)),
        ("B-202", Some(90)),
    ];
    let mut ids = Vec::new();
    for (room_no, capacity) in specs {
        ids.push(state.entity_repo.insert_room(room_no, capacity)?);
    }
    Ok(ids)
}

fn seed_courses(state: &AppState) -> Result<Vec<i64>> {
    let names = [
        "高等数学",
        "大学英语",
        "数据结构",
        "线性代数",
        "大学物理",
        "程序设计基础",
    ];
    let mut ids = Vec::new();
    for name in names {
        ids.push(state.entity_repo.insert_course(name)?);
    }
    Ok(ids)
}

fn seed_teachers(state: &AppState) -> Result<Vec<i64>> {
    let names = ["张伟", "李娜", "王强", "刘洋", "陈静"];
    let mut ids = Vec::new();
    for name in names {
        ids.push(state.entity_repo.insert_teacher(name)?);
    }
    Ok(ids)
}

fn seed_groups(state: &AppState) -> Result<Vec<i64>> {
    let names = ["计算机2501班", "计算机2502班", "软件2501班", "数学2501班"];
    let mut ids = Vec::new();
    for name in names {
        ids.push(state.entity_repo.insert_group(name)?);
    }
    Ok(ids)
}

/// 装填覆盖单双周的示例模板
///
/// 槽位安排避开模板目录的唯一约束:
/// 同 (单双周, 星期, 节次) 下教室/教师/班级各自唯一
fn seed_patterns(
    state: &AppState,
    rooms: &[i64],
    courses: &[i64],
    teachers: &[i64],
    groups: &[i64],
) -> Result<usize> {
    use Weekday::{Fri, Mon, Thu, Tue, Wed};

    // (单双周, 星期, 节次, 教室序, 课程序, 班级序, 教师序)
    let specs = [
        // 单周
        (WeekParity::Odd, Mon, Period::First, 0, 0, 0, 0),
        (WeekParity::Odd, Mon, Period::Second, 1, 1, 0, 1),
        (WeekParity::Odd, Tue, Period::First, 0, 2, 1, 2),
        (WeekParity::Odd, Wed, Period::Third, 4, 3, 3, 3),
        (WeekParity::Odd, Thu, Period::Second, 2, 4, 2, 4),
        (WeekParity::Odd, Fri, Period::Fourth, 0, 5, 0, 2),
        // 双周
        (WeekParity::Even, Mon, Period::First, 0, 0, 0, 0),
        (WeekParity::Even, Tue, Period::Second, 1, 1, 1, 1),
        (WeekParity::Even, Wed, Period::First, 5, 2, 2, 2),
        (WeekParity::Even, Thu, Period::Third, 3, 4, 3, 4),
        (WeekParity::Even, Fri, Period::First, 3, 3, 3, 3),
    ];

    for (parity, weekday, period, room_ix, course_ix, group_ix, teacher_ix) in specs {
        state.pattern_repo.insert(&LessonPattern {
            pattern_id: None,
            week_parity: parity,
            weekday,
            period,
            room_id: rooms[room_ix],
            course_id: courses[course_ix],
            group_id: groups[group_ix],
            teacher_id: teachers[teacher_ix],
        })?;
    }
    Ok(specs.len())
}
