// ==========================================
// 高校排课系统 - CLI 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 课表冲突检测与调课决策支持
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};

use campus_timetable::api::timetable_api::OccurrenceView;
use campus_timetable::app::{get_default_db_path, AppState};
use campus_timetable::domain::types::weekday_zh;
use campus_timetable::logging;

fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("高校排课系统 - 课表冲突检测与调课");
    tracing::info!("系统版本: {}", campus_timetable::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let args: Vec<String> = std::env::args().collect();
    let command = match args.get(1) {
        Some(c) => c.as_str(),
        None => {
            print_usage();
            return Ok(());
        }
    };

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command {
        "init" => cmd_init(&state),
        "semester" => cmd_semester(&state, &args),
        "day" => cmd_day(&state, &args),
        "week" => cmd_week(&state, &args),
        "month" => cmd_month(&state, &args),
        "patterns" => cmd_patterns(&state),
        "options" => cmd_options(&state, &args),
        "week-options" => cmd_week_options(&state, &args),
        "move-once" => cmd_move_once(&state, &args),
        "move-permanent" => cmd_move_permanent(&state, &args),
        "log" => cmd_log(&state, &args),
        other => {
            print_usage();
            bail!("未知子命令: {}", other);
        }
    }
}

fn print_usage() {
    println!("高校排课系统 - 课表冲突检测与调课");
    println!();
    println!("用法: campus-timetable <子命令> [参数]");
    println!();
    println!("子命令:");
    println!("  init                                     初始化数据库 (建表, 幂等)");
    println!("  semester <开学日> <结束日>               配置学期边界 (YYYY-MM-DD)");
    println!("  day <日期>                               查询单日课表");
    println!("  week <周序号>                            查询教学周课表");
    println!("  month <年-月>                            查询月份课表 (如 2025-09)");
    println!("  patterns                                 列出全部排课模板");
    println!("  options <课次ID> <日期>                  单次调课候选槽位");
    println!("  week-options <课次ID> <周序号>           永久调课候选槽位");
    println!("  move-once <课次ID> <日期> <槽位ID>       提交单次调课");
    println!("  move-permanent <课次ID> <日期> <槽位ID>  提交永久调课");
    println!("  log [条数]                               查看调课日志 (默认 20 条)");
    println!();
    println!("环境变量 CAMPUS_TIMETABLE_DB_PATH 可指定数据库文件路径");
}

// ==========================================
// 子命令实现
// ==========================================

fn cmd_init(state: &AppState) -> Result<()> {
    // AppState::new 已执行建表脚本,这里只报告结果
    println!("数据库初始化完成: {}", state.get_db_path());
    match state.semester_calendar() {
        Ok(calendar) => println!(
            "学期: {} ~ {} (共 {} 周)",
            calendar.semester_start(),
            calendar.semester_end(),
            calendar.week_count()
        ),
        Err(_) => println!("学期尚未配置, 请执行: campus-timetable semester <开学日> <结束日>"),
    }
    Ok(())
}

fn cmd_semester(state: &AppState, args: &[String]) -> Result<()> {
    let start = parse_date(arg(args, 2, "开学日")?)?;
    let end = parse_date(arg(args, 3, "结束日")?)?;
    state.config.set_semester(start, end)?;
    let calendar = state.semester_calendar()?;
    println!(
        "学期已配置: {} ~ {} (共 {} 周)",
        calendar.semester_start(),
        calendar.semester_end(),
        calendar.week_count()
    );
    Ok(())
}

fn cmd_day(state: &AppState, args: &[String]) -> Result<()> {
    let date = parse_date(arg(args, 2, "日期")?)?;
    let api = state.timetable_api()?;
    let calendar = state.semester_calendar()?;
    let lessons = api.day_view(date)?;

    match calendar.week_no_of(date) {
        Some(week_no) => println!(
            "课表 {} (第{}周 {} {})",
            date,
            week_no,
            calendar.week_parity_of(date),
            weekday_zh(date.weekday())
        ),
        None => println!("课表 {} (学期外)", date),
    }
    print_occurrences(&lessons);
    Ok(())
}

fn cmd_week(state: &AppState, args: &[String]) -> Result<()> {
    let week_no: u32 = arg(args, 2, "周序号")?
        .parse()
        .context("周序号必须是正整数")?;
    let api = state.timetable_api()?;
    let view = api.week_view(week_no)?;

    println!(
        "第{}周 ({}) {} ~ {}",
        view.week_no, view.week_parity, view.monday, view.friday
    );
    for day in &view.days {
        println!("--- {} {} ---", day.date, day.weekday);
        print_occurrences(&day.lessons);
    }
    Ok(())
}

fn cmd_month(state: &AppState, args: &[String]) -> Result<()> {
    let raw = arg(args, 2, "年-月")?;
    let (year, month) = parse_year_month(raw)?;
    let api = state.timetable_api()?;
    let lessons = api.month_view(year, month)?;
    println!("课表 {}-{:02} (学期内教学日)", year, month);
    print_occurrences(&lessons);
    Ok(())
}

fn cmd_patterns(state: &AppState) -> Result<()> {
    let api = state.timetable_api()?;
    let patterns = api.list_patterns()?;
    println!("排课模板 (共 {} 条)", patterns.len());
    for p in &patterns {
        println!(
            "  [{}] {} {} {} 教室{} | {} | {} | {}",
            p.pattern_id,
            p.week_parity,
            p.weekday,
            p.period,
            p.room_no,
            p.course_name,
            p.group_name,
            p.teacher_name
        );
    }
    Ok(())
}

fn cmd_options(state: &AppState, args: &[String]) -> Result<()> {
    let occurrence_id = parse_id(arg(args, 2, "课次ID")?)?;
    let date = parse_date(arg(args, 3, "日期")?)?;
    let api = state.reschedule_api()?;
    let options = api.options_for_date(occurrence_id, date)?;
    println!("课次 {} 在 {} 的空闲槽位 (共 {} 个):", occurrence_id, date, options.len());
    for o in &options {
        println!("  [{}] {} {} 教室{}", o.option_id, o.weekday, o.period, o.room_no);
    }
    Ok(())
}

fn cmd_week_options(state: &AppState, args: &[String]) -> Result<()> {
    let occurrence_id = parse_id(arg(args, 2, "课次ID")?)?;
    let week_no: u32 = arg(args, 3, "周序号")?
        .parse()
        .context("周序号必须是正整数")?;
    let api = state.reschedule_api()?;
    let options = api.options_for_week(occurrence_id, week_no)?;
    println!(
        "课次 {} 所属模板在第{}周的空闲槽位 (共 {} 个):",
        occurrence_id,
        week_no,
        options.len()
    );
    for o in &options {
        println!("  [{}] {} {} 教室{}", o.option_id, o.weekday, o.period, o.room_no);
    }
    Ok(())
}

fn cmd_move_once(state: &AppState, args: &[String]) -> Result<()> {
    let occurrence_id = parse_id(arg(args, 2, "课次ID")?)?;
    let date = parse_date(arg(args, 3, "日期")?)?;
    let option_id = parse_id(arg(args, 4, "槽位ID")?)?;
    let api = state.reschedule_api()?;
    let view = api.reschedule_once(occurrence_id, date, option_id)?;
    println!("单次调课已提交:");
    print_occurrences(std::slice::from_ref(&view));
    Ok(())
}

fn cmd_move_permanent(state: &AppState, args: &[String]) -> Result<()> {
    let occurrence_id = parse_id(arg(args, 2, "课次ID")?)?;
    let date = parse_date(arg(args, 3, "日期")?)?;
    let option_id = parse_id(arg(args, 4, "槽位ID")?)?;
    let api = state.reschedule_api()?;
    let summary = api.reschedule_permanently(occurrence_id, date, option_id)?;
    println!(
        "永久调课已提交: 模板 {} → {} {} {} 教室{}",
        summary.pattern.pattern_id,
        summary.pattern.week_parity,
        summary.pattern.weekday,
        summary.pattern.period,
        summary.pattern.room_no
    );
    println!("级联移动 {} 节课:", summary.affected_count);
    print_occurrences(&summary.moved);
    Ok(())
}

fn cmd_log(state: &AppState, args: &[String]) -> Result<()> {
    let limit: i32 = match args.get(2) {
        Some(raw) => raw.parse().context("条数必须是正整数")?,
        None => 20,
    };
    let logs = state.action_log_repo.find_recent(limit)?;
    println!("最近 {} 条调课日志:", logs.len());
    for log in &logs {
        println!(
            "  {} [{}] {} {}",
            log.action_ts.format("%Y-%m-%d %H:%M:%S"),
            log.actor,
            log.action_id,
            log.summary_text()
        );
    }
    Ok(())
}

// ==========================================
// 输出与解析辅助
// ==========================================

fn print_occurrences(lessons: &[OccurrenceView]) {
    if lessons.is_empty() {
        println!("  (无课)");
        return;
    }
    for l in lessons {
        println!(
            "  [{}] {} {} {} 教室{} | {} | {} | {}",
            l.occurrence_id,
            l.lesson_date,
            l.weekday,
            l.period,
            l.room_no,
            l.course_name,
            l.group_name,
            l.teacher_name
        );
    }
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .map(|s| s.as_str())
        .ok_or_else(|| anyhow!("缺少参数: {}", name))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("日期格式应为 YYYY-MM-DD, 实际: {}", raw))
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .with_context(|| format!("ID 必须是整数, 实际: {}", raw))
}

fn parse_year_month(raw: &str) -> Result<(i32, u32)> {
    let (y, m) = raw
        .split_once('-')
        .ok_or_else(|| anyhow!("年月格式应为 YYYY-MM, 实际: {}", raw))?;
    let year: i32 = y.parse().with_context(|| format!("非法年份: {}", y))?;
    let month: u32 = m.parse().with_context(|| format!("非法月份: {}", m))?;
    Ok((year, month))
}
