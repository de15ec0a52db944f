// ==========================================
// Repository层集成测试
// ==========================================
// 测试范围:
// 1. 繁育流程仓储: 创建/查询/touch
// 2. 鱼卵批次与孵化日记录: 唯一约束, seq分配, 顺序查询
// 3. 鱼苗批次与存活记录: 更正/删除
// 4. 筛选轮次记录: 轮次唯一约束, max_round_index
// 5. 操作日志仓储
// ==========================================

mod test_helpers;

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;

use koi_breeding_ms::domain::action_log::{ActionLog, ActionType};
use koi_breeding_ms::domain::breeding::{BreedingProcess, EggBatch, IncubationDailyRecord};
use koi_breeding_ms::domain::classification::{ClassificationRecord, ClassificationStage};
use koi_breeding_ms::domain::fry::{FryFish, FrySurvivalRecord};
use koi_breeding_ms::domain::types::CountField;
use koi_breeding_ms::repository::action_log_repo::ActionLogRepository;
use koi_breeding_ms::repository::breeding_process_repo::BreedingProcessRepository;
use koi_breeding_ms::repository::classification_repo::{
    ClassificationRecordRepository, ClassificationStageRepository,
};
use koi_breeding_ms::repository::egg_batch_repo::{EggBatchRepository, IncubationRecordRepository};
use koi_breeding_ms::repository::error::RepositoryError;
use koi_breeding_ms::repository::fry_repo::{FryFishRepository, FrySurvivalRepository};

// ==========================================
// 测试环境
// ==========================================

struct RepoTestEnv {
    conn: Arc<Mutex<Connection>>,
    _temp_file: tempfile::NamedTempFile,
}

impl RepoTestEnv {
    fn new() -> Self {
        let (temp_file, db_path) = test_helpers::create_test_db().expect("无法创建测试数据库");
        let conn = koi_breeding_ms::db::open_sqlite_connection(&db_path).expect("无法打开数据库");
        test_helpers::insert_test_config(&conn).expect("无法写入测试配置");
        Self {
            conn: Arc::new(Mutex::new(conn)),
            _temp_file: temp_file,
        }
    }
}

fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("时间格式错误")
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("日期格式错误")
}

fn make_process(id: &str, name: &str, created: &str) -> BreedingProcess {
    BreedingProcess {
        process_id: id.to_string(),
        process_name: name.to_string(),
        father_koi: Some("K-101".to_string()),
        mother_koi: Some("K-202".to_string()),
        spawning_date: Some(d("2026-04-05")),
        created_by: "tester".to_string(),
        created_at: dt(created),
        updated_at: dt(created),
    }
}

fn make_egg_batch(id: &str, process_id: &str, quantity: i64) -> EggBatch {
    EggBatch {
        batch_id: id.to_string(),
        process_id: process_id.to_string(),
        quantity,
        laid_date: Some(d("2026-04-05")),
        created_at: dt("2026-04-05 09:00:00"),
    }
}

fn make_incubation_record(id: &str, batch_id: &str, hatched: i64, rotten: i64) -> IncubationDailyRecord {
    IncubationDailyRecord {
        record_id: id.to_string(),
        batch_id: batch_id.to_string(),
        seq: 0,
        record_date: d("2026-04-07"),
        hatched_count: hatched,
        rotten_count: rotten,
        note: None,
        created_at: dt("2026-04-07 08:30:00"),
    }
}

fn make_fry(id: &str, process_id: &str, initial: i64) -> FryFish {
    FryFish {
        fry_id: id.to_string(),
        process_id: process_id.to_string(),
        initial_count: initial,
        hatched_date: Some(d("2026-04-09")),
        created_at: dt("2026-04-09 10:00:00"),
    }
}

fn make_survival_record(id: &str, fry_id: &str, day: i32, alive: i64) -> FrySurvivalRecord {
    FrySurvivalRecord {
        record_id: id.to_string(),
        fry_id: fry_id.to_string(),
        seq: 0,
        day_number: day,
        count_alive: alive,
        note: None,
        created_at: dt("2026-04-16 08:00:00"),
    }
}

fn make_stage(id: &str, process_id: &str, total: i64) -> ClassificationStage {
    ClassificationStage {
        stage_id: id.to_string(),
        process_id: process_id.to_string(),
        total_count: total,
        started_date: Some(d("2026-05-20")),
        created_at: dt("2026-05-20 09:00:00"),
    }
}

fn make_round_record(id: &str, stage_id: &str, round_index: i32, cull: Option<i64>) -> ClassificationRecord {
    ClassificationRecord {
        record_id: id.to_string(),
        stage_id: stage_id.to_string(),
        round_index,
        cull_qualified_count: cull,
        high_qualified_count: None,
        show_qualified_count: None,
        pond_qualified_count: None,
        notes: None,
        created_by: "tester".to_string(),
        created_at: dt("2026-05-21 09:00:00"),
    }
}

// ==========================================
// 繁育流程仓储测试
// ==========================================

#[test]
fn test_breeding_process_create_and_find() {
    let env = RepoTestEnv::new();
    let repo = BreedingProcessRepository::new(env.conn.clone());

    let process = make_process("P001", "2026春·红白1号池", "2026-04-01 08:00:00");
    repo.create(&process).expect("创建流程失败");

    let found = repo.find_by_id("P001").expect("查询失败").expect("流程应存在");
    assert_eq!(found.process_name, "2026春·红白1号池");
    assert_eq!(found.father_koi.as_deref(), Some("K-101"));
    assert_eq!(found.spawning_date, Some(d("2026-04-05")));
    assert_eq!(found.created_at, dt("2026-04-01 08:00:00"));

    assert!(repo.find_by_id("不存在").expect("查询失败").is_none());
}

#[test]
fn test_breeding_process_find_all_最近创建在前() {
    let env = RepoTestEnv::new();
    let repo = BreedingProcessRepository::new(env.conn.clone());

    repo.create(&make_process("P001", "四月流程", "2026-04-01 08:00:00"))
        .expect("创建失败");
    repo.create(&make_process("P002", "五月流程", "2026-05-01 08:00:00"))
        .expect("创建失败");

    let all = repo.find_all().expect("查询失败");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].process_id, "P002");
    assert_eq!(all[1].process_id, "P001");
}

#[test]
fn test_breeding_process_touch_刷新更新时间() {
    let env = RepoTestEnv::new();
    let repo = BreedingProcessRepository::new(env.conn.clone());

    repo.create(&make_process("P001", "测试流程", "2024-01-01 00:00:00"))
        .expect("创建失败");

    repo.touch("P001").expect("touch失败");

    let found = repo.find_by_id("P001").expect("查询失败").expect("流程应存在");
    assert!(
        found.updated_at > dt("2024-01-01 00:00:00"),
        "touch后updated_at应晚于初始值"
    );
    assert_eq!(found.created_at, dt("2024-01-01 00:00:00"));
}

// ==========================================
// 鱼卵批次与孵化日记录测试
// ==========================================

#[test]
fn test_egg_batch_每个流程至多一个() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let batch_repo = EggBatchRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");

    batch_repo
        .create(&make_egg_batch("B001", "P001", 2000))
        .expect("首个批次创建应成功");

    let result = batch_repo.create(&make_egg_batch("B002", "P001", 500));
    assert!(
        matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))),
        "同一流程的第二个批次应违反唯一约束: {:?}",
        result
    );

    let found = batch_repo.find_by_process("P001").expect("查询失败");
    assert_eq!(found.map(|b| b.batch_id), Some("B001".to_string()));
}

#[test]
fn test_incubation_record_seq分配与顺序() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let batch_repo = EggBatchRepository::new(env.conn.clone());
    let record_repo = IncubationRecordRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");
    batch_repo
        .create(&make_egg_batch("B001", "P001", 2000))
        .expect("创建失败");

    let seq1 = record_repo
        .insert(&make_incubation_record("R001", "B001", 0, 10))
        .expect("插入失败");
    let seq2 = record_repo
        .insert(&make_incubation_record("R002", "B001", 500, 30))
        .expect("插入失败");
    let seq3 = record_repo
        .insert(&make_incubation_record("R003", "B001", 1500, 60))
        .expect("插入失败");

    assert_eq!((seq1, seq2, seq3), (1, 2, 3), "seq应单调递增");

    let records = record_repo.find_by_batch("B001").expect("查询失败");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].record_id, "R001");
    assert_eq!(records[2].record_id, "R003");

    let latest = record_repo
        .find_latest("B001")
        .expect("查询失败")
        .expect("应有记录");
    assert_eq!(latest.record_id, "R003");
    assert_eq!(latest.hatched_count, 1500);
}

#[test]
fn test_incubation_record_更正与删除() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let batch_repo = EggBatchRepository::new(env.conn.clone());
    let record_repo = IncubationRecordRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");
    batch_repo
        .create(&make_egg_batch("B001", "P001", 2000))
        .expect("创建失败");
    record_repo
        .insert(&make_incubation_record("R001", "B001", 100, 5))
        .expect("插入失败");

    record_repo
        .update_counts("R001", 120, 8, Some("更正录入错误"))
        .expect("更正失败");

    let found = record_repo
        .find_by_id("R001")
        .expect("查询失败")
        .expect("记录应存在");
    assert_eq!(found.hatched_count, 120);
    assert_eq!(found.rotten_count, 8);
    assert_eq!(found.note.as_deref(), Some("更正录入错误"));

    record_repo.delete("R001").expect("删除失败");
    assert!(record_repo.find_by_id("R001").expect("查询失败").is_none());

    // 重复删除返回NotFound
    let result = record_repo.delete("R001");
    assert!(matches!(result, Err(RepositoryError::NotFound { .. })));
}

// ==========================================
// 鱼苗批次与存活记录测试
// ==========================================

#[test]
fn test_fry_fish_每个流程至多一个() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let fry_repo = FryFishRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");

    fry_repo
        .create(&make_fry("F001", "P001", 1500))
        .expect("首个鱼苗批次创建应成功");

    let result = fry_repo.create(&make_fry("F002", "P001", 100));
    assert!(matches!(
        result,
        Err(RepositoryError::UniqueConstraintViolation(_))
    ));
}

#[test]
fn test_survival_record_seq与更正删除() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let fry_repo = FryFishRepository::new(env.conn.clone());
    let survival_repo = FrySurvivalRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");
    fry_repo
        .create(&make_fry("F001", "P001", 1500))
        .expect("创建失败");

    let seq1 = survival_repo
        .insert(&make_survival_record("S001", "F001", 7, 1400))
        .expect("插入失败");
    let seq2 = survival_repo
        .insert(&make_survival_record("S002", "F001", 14, 1300))
        .expect("插入失败");
    assert_eq!((seq1, seq2), (1, 2));

    let latest = survival_repo
        .find_latest("F001")
        .expect("查询失败")
        .expect("应有记录");
    assert_eq!(latest.record_id, "S002");

    survival_repo
        .update_count("S002", 1280, None)
        .expect("更正失败");
    let found = survival_repo
        .find_by_id("S002")
        .expect("查询失败")
        .expect("记录应存在");
    assert_eq!(found.count_alive, 1280);

    survival_repo.delete("S001").expect("删除失败");
    let records = survival_repo.find_by_fry("F001").expect("查询失败");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_id, "S002");
}

// ==========================================
// 筛选轮次记录测试
// ==========================================

#[test]
fn test_classification_record_轮次唯一约束() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let stage_repo = ClassificationStageRepository::new(env.conn.clone());
    let record_repo = ClassificationRecordRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");
    stage_repo
        .create(&make_stage("ST001", "P001", 1000))
        .expect("创建失败");

    record_repo
        .create(&make_round_record("CR001", "ST001", 0, Some(400)))
        .expect("首条轮次记录应成功");

    // 同一轮次的第二条记录被唯一约束拒绝
    let result = record_repo.create(&make_round_record("CR002", "ST001", 0, Some(380)));
    assert!(
        matches!(result, Err(RepositoryError::UniqueConstraintViolation(_))),
        "同一轮次的重复记录应违反唯一约束: {:?}",
        result
    );

    assert_eq!(record_repo.count_by_stage("ST001").expect("统计失败"), 1);
}

#[test]
fn test_classification_record_max_round_index() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let stage_repo = ClassificationStageRepository::new(env.conn.clone());
    let record_repo = ClassificationRecordRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");
    stage_repo
        .create(&make_stage("ST001", "P001", 1000))
        .expect("创建失败");

    assert_eq!(record_repo.max_round_index("ST001").expect("查询失败"), None);

    record_repo
        .create(&make_round_record("CR001", "ST001", 0, Some(400)))
        .expect("插入失败");
    record_repo
        .create(&make_round_record("CR002", "ST001", 1, Some(300)))
        .expect("插入失败");

    assert_eq!(
        record_repo.max_round_index("ST001").expect("查询失败"),
        Some(1)
    );

    let by_round = record_repo
        .find_by_round("ST001", 1)
        .expect("查询失败")
        .expect("记录应存在");
    assert_eq!(by_round.record_id, "CR002");
}

#[test]
fn test_classification_record_按字段更正() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let stage_repo = ClassificationStageRepository::new(env.conn.clone());
    let record_repo = ClassificationRecordRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");
    stage_repo
        .create(&make_stage("ST001", "P001", 1000))
        .expect("创建失败");
    record_repo
        .create(&make_round_record("CR001", "ST001", 0, Some(400)))
        .expect("插入失败");

    record_repo
        .update_count("CR001", CountField::CullQualified, 420)
        .expect("更正失败");

    let found = record_repo
        .find_by_id("CR001")
        .expect("查询失败")
        .expect("记录应存在");
    assert_eq!(found.cull_qualified_count, Some(420));
    assert_eq!(found.high_qualified_count, None, "其他字段不受影响");
}

// ==========================================
// 操作日志仓储测试
// ==========================================

#[test]
fn test_action_log_插入与查询() {
    let env = RepoTestEnv::new();
    let process_repo = BreedingProcessRepository::new(env.conn.clone());
    let log_repo = ActionLogRepository::new(env.conn.clone());

    process_repo
        .create(&make_process("P001", "测试流程", "2026-04-01 08:00:00"))
        .expect("创建失败");

    let log1 = ActionLog::new(
        ActionType::CreateProcess,
        Some("P001".to_string()),
        "tester",
        Some(serde_json::json!({"process_name": "测试流程"})),
        Some("创建繁育流程".to_string()),
    );
    let log2 = ActionLog::new(ActionType::SubmitRound, Some("P001".to_string()), "tester", None, None);

    log_repo.insert(&log1).expect("插入失败");
    log_repo.insert(&log2).expect("插入失败");

    assert_eq!(log_repo.count().expect("统计失败"), 2);

    let by_process = log_repo.find_by_process("P001").expect("查询失败");
    assert_eq!(by_process.len(), 2);

    let recent = log_repo.find_recent(1).expect("查询失败");
    assert_eq!(recent.len(), 1);

    // payload_json 应完整往返
    let restored = by_process
        .iter()
        .find(|l| l.action_id == log1.action_id)
        .expect("日志应存在");
    assert_eq!(
        restored.payload_json.as_ref().and_then(|p| p.get("process_name")).and_then(|v| v.as_str()),
        Some("测试流程")
    );
}
