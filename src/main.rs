// ==========================================
// 锦鲤繁育管理系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 繁育过程记录与分级决策支持
// ==========================================

use chrono::{Days, Local};

use koi_breeding_ms::api::ApiResult;
use koi_breeding_ms::app::{get_default_db_path, AppState};
use koi_breeding_ms::i18n::t;

fn main() {
    // 初始化日志系统
    koi_breeding_ms::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", t("common.app_name"));
    tracing::info!("系统版本: {}", koi_breeding_ms::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    let app_state = AppState::new(db_path).expect("无法初始化AppState");
    tracing::info!("AppState初始化成功");

    if let Err(e) = run_demo_flow(&app_state) {
        eprintln!("演示流程执行失败: {}", e);
        std::process::exit(1);
    }
}

/// 演示流程: 建流程 → 孵化 → 鱼苗存活 → 四轮分级
fn run_demo_flow(state: &AppState) -> ApiResult<()> {
    let api = &state.breeding_api;
    let today = Local::now().date_naive();
    let spawn_date = today.checked_sub_days(Days::new(45)).unwrap_or(today);

    println!("==================================================");
    println!("{}", t("common.app_name"));
    println!("==================================================");

    // 1. 繁育流程
    let process = api.create_breeding_process(
        "2026春·红白演示池",
        Some("父本K-102".to_string()),
        Some("母本K-088".to_string()),
        Some(spawn_date),
        "demo",
    )?;
    println!("已创建繁育流程: {} ({})", process.process_name, process.process_id);

    // 2. 鱼卵批次与孵化记录
    let batch = api.create_egg_batch(&process.process_id, 2000, Some(spawn_date), "demo")?;
    api.record_incubation_day(
        &batch.batch_id,
        spawn_date.checked_add_days(Days::new(1)).unwrap_or(spawn_date),
        0,
        40,
        None,
        "demo",
    )?;
    api.record_incubation_day(
        &batch.batch_id,
        spawn_date.checked_add_days(Days::new(3)).unwrap_or(spawn_date),
        1500,
        120,
        Some("大部分已破膜".to_string()),
        "demo",
    )?;

    let incubation = api.get_incubation_summary(&batch.batch_id)?;
    println!(
        "孵化汇总: 产卵{}枚, 累计孵化{}尾, 坏卵{}枚, 健康卵{}枚",
        batch.quantity,
        incubation.total_hatched_eggs,
        incubation.total_rotten_eggs,
        incubation.healthy_eggs
    );
    if incubation.healthy_eggs < 0 {
        println!("  !! {}", t("breeding.incubation.healthy_inconsistent"));
    }

    // 3. 鱼苗批次与存活记录
    let fry = api.create_fry_batch(
        &process.process_id,
        1500,
        spawn_date.checked_add_days(Days::new(4)),
        "demo",
    )?;

    let empty = api.get_fry_survival_summary(&fry.fry_id)?;
    if empty.current_rate.is_none() {
        println!("存活率: {}", t("breeding.survival.no_records"));
    }

    api.record_fry_survival(&fry.fry_id, 7, 1350, None, "demo")?;
    api.record_fry_survival(&fry.fry_id, 14, 1280, None, "demo")?;
    api.record_fry_survival(&fry.fry_id, 30, 1210, Some("转入大池".to_string()), "demo")?;

    let survival = api.get_fry_survival_summary(&fry.fry_id)?;
    println!(
        "存活率: 7天 {}, 14天 {}, 30天 {}, 当前 {}",
        fmt_rate(survival.survival_rate_7_days),
        fmt_rate(survival.survival_rate_14_days),
        fmt_rate(survival.survival_rate_30_days),
        fmt_rate(survival.current_rate)
    );

    // 4. 分级阶段: 依次推进四轮
    let stage = api.create_classification_stage(
        &process.process_id,
        1210,
        spawn_date.checked_add_days(Days::new(40)),
        "demo",
    )?;

    for count in [700, 300, 160, 24] {
        let next = api.get_next_classification_round(&stage.stage_id)?;
        let result = api.submit_classification_round(&stage.stage_id, count, None, "demo")?;
        println!(
            "第{}轮 [{}] 提交: {}尾",
            result.round_no, next.label, count
        );
        if let Some(msg) = result.message {
            println!("  -> {}", msg);
        }
    }

    let status = api.get_classification_status(&stage.stage_id)?;
    println!("分级状态: {}", status.status_text);
    println!(
        "当前在场: {}尾, 高品质: {}, 参赛级: {}",
        status.summary.current_fish,
        status
            .summary
            .total_high_qualified
            .map(|v| v.to_string())
            .unwrap_or_else(|| t("common.unknown")),
        status
            .summary
            .total_show_qualified
            .map(|v| v.to_string())
            .unwrap_or_else(|| t("common.unknown"))
    );

    // 5. 总览与审计
    let overview = api.get_breeding_overview(&process.process_id)?;
    println!(
        "总览: 批次 {}, 鱼苗 {}, 分级 {}",
        overview.egg_batch.is_some(),
        overview.fry.is_some(),
        overview.stage.is_some()
    );

    let actions = api.list_process_actions(&process.process_id)?;
    println!("操作日志: {}条", actions.len());

    Ok(())
}

fn fmt_rate(rate: Option<f64>) -> String {
    match rate {
        Some(v) => format!("{:.1}%", v),
        None => t("common.unknown"),
    }
}
