// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use koi_breeding_ms::api::BreedingApi;
use koi_breeding_ms::config::config_manager::ConfigManager;
use koi_breeding_ms::domain::breeding::{BreedingProcess, EggBatch};
use koi_breeding_ms::domain::classification::ClassificationStage;
use koi_breeding_ms::domain::fry::FryFish;
use koi_breeding_ms::engine::classification_summary::ClassificationSummaryAggregator;
use koi_breeding_ms::engine::repositories::BreedingRepositories;
use koi_breeding_ms::engine::sequencer::ClassificationSequencer;
use koi_breeding_ms::engine::survival::SurvivalCalculator;
use koi_breeding_ms::repository::action_log_repo::ActionLogRepository;
use koi_breeding_ms::repository::breeding_process_repo::BreedingProcessRepository;
use koi_breeding_ms::repository::classification_repo::{
    ClassificationRecordRepository, ClassificationStageRepository,
};
use koi_breeding_ms::repository::egg_batch_repo::{EggBatchRepository, IncubationRecordRepository};
use koi_breeding_ms::repository::fry_repo::{FryFishRepository, FrySurvivalRepository};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub breeding_api: Arc<BreedingApi>,
    pub config_manager: Arc<ConfigManager>,

    // Repository层（用于测试数据准备与断言）
    pub process_repo: Arc<BreedingProcessRepository>,
    pub egg_batch_repo: Arc<EggBatchRepository>,
    pub incubation_repo: Arc<IncubationRecordRepository>,
    pub fry_repo: Arc<FryFishRepository>,
    pub survival_repo: Arc<FrySurvivalRepository>,
    pub stage_repo: Arc<ClassificationStageRepository>,
    pub record_repo: Arc<ClassificationRecordRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,

    // 共享连接（用于直接SQL断言）
    pub conn: Arc<Mutex<Connection>>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件
    /// - 初始化所有Repository、Engine和API
    /// - 预置全局配置
    pub fn new() -> Result<Self, String> {
        // 创建临时数据库文件并初始化schema
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        // 初始化数据库连接
        let conn = koi_breeding_ms::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        test_helpers::insert_test_config(&conn).map_err(|e| format!("预置配置失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================

        let process_repo = Arc::new(BreedingProcessRepository::new(conn.clone()));
        let egg_batch_repo = Arc::new(EggBatchRepository::new(conn.clone()));
        let incubation_repo = Arc::new(IncubationRecordRepository::new(conn.clone()));
        let fry_repo = Arc::new(FryFishRepository::new(conn.clone()));
        let survival_repo = Arc::new(FrySurvivalRepository::new(conn.clone()));
        let stage_repo = Arc::new(ClassificationStageRepository::new(conn.clone()));
        let record_repo = Arc::new(ClassificationRecordRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let repos = BreedingRepositories::new(
            process_repo.clone(),
            egg_batch_repo.clone(),
            incubation_repo.clone(),
            fry_repo.clone(),
            survival_repo.clone(),
            stage_repo.clone(),
            record_repo.clone(),
            action_log_repo.clone(),
        );

        // ==========================================
        // 初始化Engine层与API
        // ==========================================

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let breeding_api = Arc::new(BreedingApi::new(
            repos,
            Arc::new(ClassificationSequencer::new()),
            Arc::new(SurvivalCalculator::new()),
            Arc::new(ClassificationSummaryAggregator::new()),
            config_manager.clone(),
        ));

        Ok(Self {
            db_path,
            breeding_api,
            config_manager,
            process_repo,
            egg_batch_repo,
            incubation_repo,
            fry_repo,
            survival_repo,
            stage_repo,
            record_repo,
            action_log_repo,
            conn,
            _temp_file: temp_file,
        })
    }

    /// 创建测试用繁育流程
    pub fn create_process(&self, name: &str) -> BreedingProcess {
        self.breeding_api
            .create_breeding_process(name, Some("K-001".to_string()), Some("K-002".to_string()), None, "tester")
            .expect("创建繁育流程失败")
    }

    /// 创建测试用鱼卵批次
    pub fn create_egg_batch(&self, process_id: &str, quantity: i64) -> EggBatch {
        self.breeding_api
            .create_egg_batch(process_id, quantity, None, "tester")
            .expect("创建鱼卵批次失败")
    }

    /// 创建测试用鱼苗批次
    pub fn create_fry_batch(&self, process_id: &str, initial_count: i64) -> FryFish {
        self.breeding_api
            .create_fry_batch(process_id, initial_count, None, "tester")
            .expect("创建鱼苗批次失败")
    }

    /// 创建测试用分级阶段
    pub fn create_stage(&self, process_id: &str, total_count: i64) -> ClassificationStage {
        self.breeding_api
            .create_classification_stage(process_id, total_count, None, "tester")
            .expect("创建分级阶段失败")
    }

    /// 一步到位: 创建流程 + 分级阶段
    pub fn setup_stage(&self, total_count: i64) -> (BreedingProcess, ClassificationStage) {
        let process = self.create_process("分级测试流程");
        let stage = self.create_stage(&process.process_id, total_count);
        (process, stage)
    }

    /// 统计某表的总行数（直接SQL断言用）
    pub fn count_rows(&self, table: &str) -> i64 {
        let conn = self.conn.lock().expect("锁获取失败");
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .expect("统计行数失败")
    }
}
