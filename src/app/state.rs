// ==========================================
// 锦鲤繁育管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::api::BreedingApi;
use crate::config::config_manager::ConfigManager;
use crate::db;
use crate::engine::classification_summary::ClassificationSummaryAggregator;
use crate::engine::repositories::BreedingRepositories;
use crate::engine::sequencer::ClassificationSequencer;
use crate::engine::survival::SurvivalCalculator;
use crate::i18n;
use crate::perf;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::breeding_process_repo::BreedingProcessRepository;
use crate::repository::classification_repo::{
    ClassificationRecordRepository, ClassificationStageRepository,
};
use crate::repository::egg_batch_repo::{EggBatchRepository, IncubationRecordRepository};
use crate::repository::fry_repo::{FryFishRepository, FrySurvivalRepository};

/// 应用状态
///
/// 包含API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 繁育流程API
    pub breeding_api: Arc<BreedingApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库连接并初始化表结构
    /// 2. 初始化所有Repository
    /// 3. 初始化所有Engine
    /// 4. 创建API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let mut conn = db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        perf::install_sqlite_tracing(&mut conn);
        db::init_schema(&conn).map_err(|e| format!("初始化数据库结构失败: {}", e))?;
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
            process_repo,
            egg_batch_repo,
            incubation_repo,
            fry_repo,
            survival_repo,
            stage_repo,
            record_repo,
            action_log_repo.clone(),
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================

        // 配置管理器
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // 按配置设置界面语言
        match config_manager.get_ui_language() {
            Ok(lang) => i18n::set_locale(&lang),
            Err(e) => tracing::warn!("读取界面语言配置失败(使用默认zh-CN): {}", e),
        }

        // 分级轮次状态机
        let sequencer = Arc::new(ClassificationSequencer::new());

        // 存活统计引擎
        let survival_calculator = Arc::new(SurvivalCalculator::new());

        // 分级汇总引擎
        let aggregator = Arc::new(ClassificationSummaryAggregator::new());

        // ==========================================
        // 初始化API层
        // ==========================================

        let breeding_api = Arc::new(BreedingApi::new(
            repos,
            sequencer,
            survival_calculator,
            aggregator,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            breeding_api,
            config_manager,
            action_log_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/koi-breeding-ms-dev/koi_breeding.db
/// - 生产环境: 用户数据目录/koi-breeding-ms/koi_breeding.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("KOI_BREEDING_MS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖。
    let mut path = PathBuf::from("./koi_breeding.db");

    // 尝试获取用户数据目录
    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("koi-breeding-ms-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("koi-breeding-ms");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("koi_breeding.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_new_in_temp_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state_test.db");
        let state = AppState::new(db_path.to_string_lossy().to_string()).unwrap();

        assert_eq!(state.get_db_path(), db_path.to_string_lossy().as_ref());

        // 初始化后可直接创建流程
        let process = state
            .breeding_api
            .create_breeding_process("状态测试", None, None, None, "tester")
            .unwrap();
        assert!(!process.process_id.is_empty());
    }
}
