// ==========================================
// 锦鲤繁育管理系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合繁育流程门面所需的所有 Repository
// 目标: 减少 BreedingApi 的构造函数参数数量
// ==========================================

use std::sync::Arc;

use crate::repository::{
    ActionLogRepository, BreedingProcessRepository, ClassificationRecordRepository,
    ClassificationStageRepository, EggBatchRepository, FryFishRepository, FrySurvivalRepository,
    IncubationRecordRepository,
};

/// 繁育流程仓储集合
///
/// 聚合门面所需的所有 Repository,简化依赖注入。
///
/// # 包含的仓储
/// - `process_repo`: 繁育流程
/// - `egg_batch_repo`: 鱼卵批次
/// - `incubation_repo`: 孵化日记录
/// - `fry_repo`: 鱼苗批次
/// - `survival_repo`: 鱼苗存活记录
/// - `stage_repo`: 分级阶段
/// - `record_repo`: 筛选轮次记录
/// - `action_log_repo`: 操作日志
#[derive(Clone)]
pub struct BreedingRepositories {
    /// 繁育流程仓储
    pub process_repo: Arc<BreedingProcessRepository>,
    /// 鱼卵批次仓储
    pub egg_batch_repo: Arc<EggBatchRepository>,
    /// 孵化日记录仓储
    pub incubation_repo: Arc<IncubationRecordRepository>,
    /// 鱼苗批次仓储
    pub fry_repo: Arc<FryFishRepository>,
    /// 鱼苗存活记录仓储
    pub survival_repo: Arc<FrySurvivalRepository>,
    /// 分级阶段仓储
    pub stage_repo: Arc<ClassificationStageRepository>,
    /// 筛选轮次记录仓储
    pub record_repo: Arc<ClassificationRecordRepository>,
    /// 操作日志仓储
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl BreedingRepositories {
    /// 创建新的仓储集合
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        process_repo: Arc<BreedingProcessRepository>,
        egg_batch_repo: Arc<EggBatchRepository>,
        incubation_repo: Arc<IncubationRecordRepository>,
        fry_repo: Arc<FryFishRepository>,
        survival_repo: Arc<FrySurvivalRepository>,
        stage_repo: Arc<ClassificationStageRepository>,
        record_repo: Arc<ClassificationRecordRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            process_repo,
            egg_batch_repo,
            incubation_repo,
            fry_repo,
            survival_repo,
            stage_repo,
            record_repo,
            action_log_repo,
        }
    }
}
