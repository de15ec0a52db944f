// ==========================================
// 锦鲤繁育管理系统 - 繁育流程 API
// ==========================================
// 职责: 繁育流程编排门面
//   1. 孵化/存活记录录入与汇总查询
//   2. 分级轮次推进 (读取记录数 -> 推导轮次 -> 写入记录)
//   3. 管理性更正与删除 (独立于正向状态机)
//   4. ActionLog记录
// 红线: 正向流程只追加记录,不改写历史
// 红线: 轮次由记录数推导,调用方不得指定
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::breeding::{BreedingProcess, EggBatch, IncubationDailyRecord};
use crate::domain::classification::{ClassificationRecord, ClassificationStage};
use crate::domain::fry::{FryFish, FrySurvivalRecord};
use crate::domain::types::{ClassificationRound, CountField};
use crate::engine::classification_summary::{ClassificationSummary, ClassificationSummaryAggregator};
use crate::engine::repositories::BreedingRepositories;
use crate::engine::sequencer::{ClassificationSequencer, SequencerError};
use crate::engine::survival::{FrySurvivalSummary, IncubationSummary, SurvivalCalculator};
use crate::i18n::{t, t_with_args};
use crate::perf::PerfGuard;
use crate::repository::error::RepositoryError;

// ==========================================
// 响应类型
// ==========================================

/// 下一轮次信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextRoundInfo {
    pub round_no: u32,        // 显示轮次 (1-4)
    pub round: ClassificationRound,
    pub field_name: String,   // 该轮填写的计数字段
    pub label: String,        // 轮次名称 (按当前语言)
    pub is_terminal: bool,    // 是否终轮
}

/// 轮次提交结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRoundResult {
    pub record: ClassificationRecord,
    pub round: ClassificationRound,
    pub round_no: u32,
    pub is_terminal: bool,
    /// 终轮提交后的提示 (可开始个体标识流程)
    pub message: Option<String>,
}

/// 分级阶段状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationStatus {
    pub stage_id: String,
    pub total_count: i64,
    pub round_no: u32,                          // 显示轮次: min(已有记录数,3)+1
    pub completed: bool,                        // 四轮是否全部提交
    pub next_round: Option<ClassificationRound>,
    pub next_field: Option<String>,
    pub summary: ClassificationSummary,
    pub status_text: String,                    // "第 N 轮 / 共 4 轮" 或完成提示
}

/// 繁育流程总览
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingOverview {
    pub process: BreedingProcess,
    pub egg_batch: Option<EggBatch>,
    pub incubation: Option<IncubationSummary>,
    pub fry: Option<FryFish>,
    pub survival: Option<FrySurvivalSummary>,
    pub stage: Option<ClassificationStage>,
    pub classification: Option<ClassificationStatus>,
}

// ==========================================
// BreedingApi - 繁育流程 API
// ==========================================

/// 繁育流程API
///
/// 职责：
/// 1. 繁育流程/批次/阶段的创建
/// 2. 孵化与存活记录录入,汇总查询
/// 3. 分级轮次推进与状态查询
/// 4. 管理性更正与删除
/// 5. ActionLog记录
pub struct BreedingApi {
    repos: BreedingRepositories,
    sequencer: Arc<ClassificationSequencer>,
    survival_calculator: Arc<SurvivalCalculator>,
    aggregator: Arc<ClassificationSummaryAggregator>,
    config: Arc<ConfigManager>,
}

impl BreedingApi {
    /// 创建新的BreedingApi实例
    ///
    /// # 参数
    /// - repos: 仓储集合
    /// - sequencer: 分级轮次状态机
    /// - survival_calculator: 存活统计引擎
    /// - aggregator: 分级汇总引擎
    /// - config: 配置管理器
    pub fn new(
        repos: BreedingRepositories,
        sequencer: Arc<ClassificationSequencer>,
        survival_calculator: Arc<SurvivalCalculator>,
        aggregator: Arc<ClassificationSummaryAggregator>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            repos,
            sequencer,
            survival_calculator,
            aggregator,
            config,
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 解析操作人: 为空时使用配置的默认操作人
    fn resolve_actor(&self, operator: &str) -> String {
        let trimmed = operator.trim();
        if trimmed.is_empty() {
            self.config
                .get_default_actor()
                .unwrap_or_else(|_| "farm-op".to_string())
        } else {
            trimmed.to_string()
        }
    }

    /// 校验备注长度 (上限来自配置)
    fn validate_note(&self, note: Option<&str>) -> ApiResult<()> {
        if let Some(n) = note {
            let max_len = self.config.get_notes_max_len().unwrap_or(500);
            if n.chars().count() > max_len {
                return Err(ApiError::InvalidInput(format!(
                    "备注长度超过上限({}字)",
                    max_len
                )));
            }
        }
        Ok(())
    }

    /// 记录操作日志,失败时只记录警告（不影响主要操作）
    fn log_action(&self, log: ActionLog) {
        if let Err(e) = self.repos.action_log_repo.insert(&log) {
            warn!(error = %e, "记录操作日志失败");
        }
    }

    /// 刷新流程更新时间,失败时只记录警告
    fn touch_process(&self, process_id: &str) {
        if let Err(e) = self.repos.process_repo.touch(process_id) {
            warn!(process_id = %process_id, error = %e, "刷新流程更新时间失败");
        }
    }

    // ==========================================
    // 繁育流程
    // ==========================================

    /// 创建繁育流程
    ///
    /// # 参数
    /// - process_name: 流程名称 (不能为空)
    /// - father_koi / mother_koi: 父本/母本标识
    /// - spawning_date: 产卵日期
    /// - operator: 操作人
    ///
    /// # 返回
    /// - Ok(BreedingProcess): 创建的流程
    /// - Err(ApiError): 参数或数据库错误
    pub fn create_breeding_process(
        &self,
        process_name: &str,
        father_koi: Option<String>,
        mother_koi: Option<String>,
        spawning_date: Option<NaiveDate>,
        operator: &str,
    ) -> ApiResult<BreedingProcess> {
        if process_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("流程名称不能为空".to_string()));
        }

        let actor = self.resolve_actor(operator);
        let now = Utc::now().naive_utc();
        let process = BreedingProcess {
            process_id: Uuid::new_v4().to_string(),
            process_name: process_name.trim().to_string(),
            father_koi,
            mother_koi,
            spawning_date,
            created_by: actor.clone(),
            created_at: now,
            updated_at: now,
        };

        self.repos.process_repo.create(&process)?;

        info!(process_id = %process.process_id, process_name = %process.process_name, "创建繁育流程");

        self.log_action(ActionLog::new(
            ActionType::CreateProcess,
            Some(process.process_id.clone()),
            &actor,
            Some(serde_json::json!({
                "process_name": process.process_name,
                "father_koi": process.father_koi,
                "mother_koi": process.mother_koi,
            })),
            Some(format!("创建繁育流程: {}", process.process_name)),
        ));

        Ok(process)
    }

    /// 查询所有繁育流程
    pub fn list_breeding_processes(&self) -> ApiResult<Vec<BreedingProcess>> {
        Ok(self.repos.process_repo.find_all()?)
    }

    /// 查询单个繁育流程
    pub fn get_breeding_process(&self, process_id: &str) -> ApiResult<Option<BreedingProcess>> {
        if process_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("流程ID不能为空".to_string()));
        }
        Ok(self.repos.process_repo.find_by_id(process_id)?)
    }

    /// 繁育流程总览 (流程 + 三个环节的实体与汇总)
    ///
    /// # 返回
    /// - Ok(BreedingOverview): 各环节未创建时对应字段为 None
    /// - Err(NotFound): 流程不存在
    pub fn get_breeding_overview(&self, process_id: &str) -> ApiResult<BreedingOverview> {
        let _perf = PerfGuard::new("get_breeding_overview");

        let process = self
            .repos
            .process_repo
            .find_by_id(process_id)?
            .ok_or_else(|| ApiError::NotFound(format!("繁育流程(id={})不存在", process_id)))?;

        let egg_batch = self.repos.egg_batch_repo.find_by_process(process_id)?;
        let incubation = match &egg_batch {
            Some(batch) => {
                let records = self.repos.incubation_repo.find_by_batch(&batch.batch_id)?;
                Some(
                    self.survival_calculator
                        .incubation_summary(batch.quantity, &records),
                )
            }
            None => None,
        };

        let fry = self.repos.fry_repo.find_by_process(process_id)?;
        let survival = match &fry {
            Some(f) => {
                let records = self.repos.survival_repo.find_by_fry(&f.fry_id)?;
                Some(
                    self.survival_calculator
                        .fry_survival_summary(f.initial_count, &records),
                )
            }
            None => None,
        };

        let stage = self.repos.stage_repo.find_by_process(process_id)?;
        let classification = match &stage {
            Some(s) => Some(self.get_classification_status(&s.stage_id)?),
            None => None,
        };

        Ok(BreedingOverview {
            process,
            egg_batch,
            incubation,
            fry,
            survival,
            stage,
            classification,
        })
    }

    /// 查询流程的操作日志 (按时间倒序)
    pub fn list_process_actions(&self, process_id: &str) -> ApiResult<Vec<ActionLog>> {
        if process_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("流程ID不能为空".to_string()));
        }
        Ok(self.repos.action_log_repo.find_by_process(process_id)?)
    }

    // ==========================================
    // 鱼卵批次与孵化记录
    // ==========================================

    /// 创建鱼卵批次 (每个流程至多一个)
    ///
    /// # 参数
    /// - process_id: 所属繁育流程
    /// - quantity: 产卵总数 (必须为正数,创建后不可变)
    /// - laid_date: 产卵日期
    /// - operator: 操作人
    pub fn create_egg_batch(
        &self,
        process_id: &str,
        quantity: i64,
        laid_date: Option<NaiveDate>,
        operator: &str,
    ) -> ApiResult<EggBatch> {
        if process_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("流程ID不能为空".to_string()));
        }
        if quantity <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "鱼卵数量必须为正数: {}",
                quantity
            )));
        }

        self.repos
            .process_repo
            .find_by_id(process_id)?
            .ok_or_else(|| ApiError::NotFound(format!("繁育流程(id={})不存在", process_id)))?;

        let actor = self.resolve_actor(operator);
        let batch = EggBatch {
            batch_id: Uuid::new_v4().to_string(),
            process_id: process_id.to_string(),
            quantity,
            laid_date,
            created_at: Utc::now().naive_utc(),
        };

        match self.repos.egg_batch_repo.create(&batch) {
            Ok(_) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "繁育流程{}已存在鱼卵批次",
                    process_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(batch_id = %batch.batch_id, process_id = %process_id, quantity, "创建鱼卵批次");

        self.log_action(ActionLog::new(
            ActionType::CreateEggBatch,
            Some(process_id.to_string()),
            &actor,
            Some(serde_json::json!({
                "batch_id": batch.batch_id,
                "quantity": quantity,
            })),
            Some(format!("创建鱼卵批次: {}枚", quantity)),
        ));
        self.touch_process(process_id);

        Ok(batch)
    }

    /// 录入孵化日记录
    ///
    /// # 参数
    /// - batch_id: 鱼卵批次ID
    /// - record_date: 记录日期
    /// - hatched_count / rotten_count: 截至当日的累计孵化数/坏卵数 (非负)
    /// - note: 备注
    /// - operator: 操作人
    ///
    /// # 规则
    /// - 记录为累计值快照,引擎不校验与批次总数的上限关系
    /// - 健康卵数为负时仅写警告日志,数据照常落库
    pub fn record_incubation_day(
        &self,
        batch_id: &str,
        record_date: NaiveDate,
        hatched_count: i64,
        rotten_count: i64,
        note: Option<String>,
        operator: &str,
    ) -> ApiResult<IncubationDailyRecord> {
        if hatched_count < 0 || rotten_count < 0 {
            return Err(ApiError::InvalidCount(format!(
                "累计计数不能为负: hatched={}, rotten={}",
                hatched_count, rotten_count
            )));
        }
        self.validate_note(note.as_deref())?;
        if batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }

        let batch = self
            .repos
            .egg_batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("鱼卵批次(id={})不存在", batch_id)))?;

        if batch.quantity - hatched_count - rotten_count < 0 {
            warn!(
                batch_id = %batch_id,
                quantity = batch.quantity,
                hatched_count,
                rotten_count,
                "孵化累计数超过批次总数,健康卵数为负"
            );
        }

        let actor = self.resolve_actor(operator);
        let mut record = IncubationDailyRecord {
            record_id: Uuid::new_v4().to_string(),
            batch_id: batch_id.to_string(),
            seq: 0,
            record_date,
            hatched_count,
            rotten_count,
            note,
            created_at: Utc::now().naive_utc(),
        };
        record.seq = self.repos.incubation_repo.insert(&record)?;

        self.log_action(ActionLog::new(
            ActionType::RecordIncubation,
            Some(batch.process_id.clone()),
            &actor,
            Some(serde_json::json!({
                "record_id": record.record_id,
                "batch_id": batch_id,
                "record_date": record_date.format("%Y-%m-%d").to_string(),
                "hatched_count": hatched_count,
                "rotten_count": rotten_count,
            })),
            None,
        ));
        self.touch_process(&batch.process_id);

        Ok(record)
    }

    /// 查询批次的孵化日记录 (插入顺序)
    pub fn list_incubation_records(&self, batch_id: &str) -> ApiResult<Vec<IncubationDailyRecord>> {
        Ok(self.repos.incubation_repo.find_by_batch(batch_id)?)
    }

    /// 孵化汇总
    ///
    /// # 返回
    /// - Ok(IncubationSummary): 累计孵化/坏卵与健康卵数 (健康卵可能为负)
    /// - Err(NotFound): 批次不存在
    pub fn get_incubation_summary(&self, egg_batch_id: &str) -> ApiResult<IncubationSummary> {
        if egg_batch_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("批次ID不能为空".to_string()));
        }

        let batch = self
            .repos
            .egg_batch_repo
            .find_by_id(egg_batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("鱼卵批次(id={})不存在", egg_batch_id)))?;

        let records = self.repos.incubation_repo.find_by_batch(egg_batch_id)?;
        Ok(self
            .survival_calculator
            .incubation_summary(batch.quantity, &records))
    }

    // ==========================================
    // 鱼苗批次与存活记录
    // ==========================================

    /// 创建鱼苗批次 (每个流程至多一个)
    ///
    /// # 参数
    /// - process_id: 所属繁育流程
    /// - initial_count: 鱼苗初始数量 (必须为正数,创建后不可变)
    /// - hatched_date: 孵化完成日期
    /// - operator: 操作人
    pub fn create_fry_batch(
        &self,
        process_id: &str,
        initial_count: i64,
        hatched_date: Option<NaiveDate>,
        operator: &str,
    ) -> ApiResult<FryFish> {
        if process_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("流程ID不能为空".to_string()));
        }
        if initial_count <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "鱼苗初始数量必须为正数: {}",
                initial_count
            )));
        }

        self.repos
            .process_repo
            .find_by_id(process_id)?
            .ok_or_else(|| ApiError::NotFound(format!("繁育流程(id={})不存在", process_id)))?;

        let actor = self.resolve_actor(operator);
        let fry = FryFish {
            fry_id: Uuid::new_v4().to_string(),
            process_id: process_id.to_string(),
            initial_count,
            hatched_date,
            created_at: Utc::now().naive_utc(),
        };

        match self.repos.fry_repo.create(&fry) {
            Ok(_) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "繁育流程{}已存在鱼苗批次",
                    process_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(fry_id = %fry.fry_id, process_id = %process_id, initial_count, "创建鱼苗批次");

        self.log_action(ActionLog::new(
            ActionType::CreateFryBatch,
            Some(process_id.to_string()),
            &actor,
            Some(serde_json::json!({
                "fry_id": fry.fry_id,
                "initial_count": initial_count,
            })),
            Some(format!("创建鱼苗批次: {}尾", initial_count)),
        ));
        self.touch_process(process_id);

        Ok(fry)
    }

    /// 录入鱼苗存活记录
    ///
    /// # 参数
    /// - fry_id: 鱼苗批次ID
    /// - day_number: 孵化后第几天 (非负)
    /// - count_alive: 当前存活数快照 (非负,不是增量)
    /// - note: 备注
    /// - operator: 操作人
    ///
    /// # 规则
    /// - count_alive 超过初始数量时仅写警告日志,数据照常落库
    pub fn record_fry_survival(
        &self,
        fry_id: &str,
        day_number: i32,
        count_alive: i64,
        note: Option<String>,
        operator: &str,
    ) -> ApiResult<FrySurvivalRecord> {
        if count_alive < 0 {
            return Err(ApiError::InvalidCount(format!(
                "存活数不能为负: {}",
                count_alive
            )));
        }
        if day_number < 0 {
            return Err(ApiError::InvalidInput(format!(
                "天数不能为负: {}",
                day_number
            )));
        }
        self.validate_note(note.as_deref())?;
        if fry_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("鱼苗批次ID不能为空".to_string()));
        }

        let fry = self
            .repos
            .fry_repo
            .find_by_id(fry_id)?
            .ok_or_else(|| ApiError::NotFound(format!("鱼苗批次(id={})不存在", fry_id)))?;

        if count_alive > fry.initial_count {
            warn!(
                fry_id = %fry_id,
                initial_count = fry.initial_count,
                count_alive,
                "存活数超过初始数量"
            );
        }

        let actor = self.resolve_actor(operator);
        let mut record = FrySurvivalRecord {
            record_id: Uuid::new_v4().to_string(),
            fry_id: fry_id.to_string(),
            seq: 0,
            day_number,
            count_alive,
            note,
            created_at: Utc::now().naive_utc(),
        };
        record.seq = self.repos.survival_repo.insert(&record)?;

        self.log_action(ActionLog::new(
            ActionType::RecordSurvival,
            Some(fry.process_id.clone()),
            &actor,
            Some(serde_json::json!({
                "record_id": record.record_id,
                "fry_id": fry_id,
                "day_number": day_number,
                "count_alive": count_alive,
            })),
            None,
        ));
        self.touch_process(&fry.process_id);

        Ok(record)
    }

    /// 查询鱼苗批次的存活记录 (插入顺序)
    pub fn list_fry_survival_records(&self, fry_id: &str) -> ApiResult<Vec<FrySurvivalRecord>> {
        Ok(self.repos.survival_repo.find_by_fry(fry_id)?)
    }

    /// 鱼苗存活率汇总
    ///
    /// # 返回
    /// - Ok(FrySurvivalSummary): 7/14/30天与当前存活率,对应时间点无记录时为 None
    /// - Err(NotFound): 鱼苗批次不存在
    pub fn get_fry_survival_summary(&self, fry_fish_id: &str) -> ApiResult<FrySurvivalSummary> {
        if fry_fish_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("鱼苗批次ID不能为空".to_string()));
        }

        let fry = self
            .repos
            .fry_repo
            .find_by_id(fry_fish_id)?
            .ok_or_else(|| ApiError::NotFound(format!("鱼苗批次(id={})不存在", fry_fish_id)))?;

        let records = self.repos.survival_repo.find_by_fry(fry_fish_id)?;
        Ok(self
            .survival_calculator
            .fry_survival_summary(fry.initial_count, &records))
    }

    // ==========================================
    // 分级阶段
    // ==========================================

    /// 创建分级阶段 (每个流程至多一个)
    ///
    /// # 参数
    /// - process_id: 所属繁育流程
    /// - total_count: 进入分级的起始总数 (必须为正数,创建后不可变)
    /// - started_date: 分级开始日期
    /// - operator: 操作人
    pub fn create_classification_stage(
        &self,
        process_id: &str,
        total_count: i64,
        started_date: Option<NaiveDate>,
        operator: &str,
    ) -> ApiResult<ClassificationStage> {
        if process_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("流程ID不能为空".to_string()));
        }
        if total_count <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "分级起始总数必须为正数: {}",
                total_count
            )));
        }

        self.repos
            .process_repo
            .find_by_id(process_id)?
            .ok_or_else(|| ApiError::NotFound(format!("繁育流程(id={})不存在", process_id)))?;

        let actor = self.resolve_actor(operator);
        let stage = ClassificationStage {
            stage_id: Uuid::new_v4().to_string(),
            process_id: process_id.to_string(),
            total_count,
            started_date,
            created_at: Utc::now().naive_utc(),
        };

        match self.repos.stage_repo.create(&stage) {
            Ok(_) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(ApiError::BusinessRuleViolation(format!(
                    "繁育流程{}已存在分级阶段",
                    process_id
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(stage_id = %stage.stage_id, process_id = %process_id, total_count, "创建分级阶段");

        self.log_action(ActionLog::new(
            ActionType::CreateStage,
            Some(process_id.to_string()),
            &actor,
            Some(serde_json::json!({
                "stage_id": stage.stage_id,
                "total_count": total_count,
            })),
            Some(format!("创建分级阶段: {}尾进入筛选", total_count)),
        ));
        self.touch_process(process_id);

        Ok(stage)
    }

    /// 查询下一轮次
    ///
    /// # 返回
    /// - Ok(NextRoundInfo): 下一轮的轮次/字段/是否终轮
    /// - Err(NotFound): 阶段不存在
    /// - Err(StageAlreadyComplete): 四轮已全部提交
    pub fn get_next_classification_round(&self, stage_id: &str) -> ApiResult<NextRoundInfo> {
        if stage_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("阶段ID不能为空".to_string()));
        }

        self.repos
            .stage_repo
            .find_by_id(stage_id)?
            .ok_or_else(|| ApiError::NotFound(format!("分级阶段(id={})不存在", stage_id)))?;

        let existing = self.repos.record_repo.count_by_stage(stage_id)?;
        let round = self.sequencer.next_round(existing).map_err(|e| match e {
            SequencerError::StageAlreadyComplete { existing } => ApiError::StageAlreadyComplete {
                stage_id: stage_id.to_string(),
                existing,
            },
        })?;

        Ok(NextRoundInfo {
            round_no: round.round_no(),
            round,
            field_name: round.count_field().column().to_string(),
            label: t(round.label_key()),
            is_terminal: round.is_terminal(),
        })
    }

    /// 提交分级轮次
    ///
    /// 读取已有记录数推导轮次,只填写该轮对应的计数字段,其余字段保持空。
    /// 并发提交同一轮次时,后到者得到 RoundConflict。
    ///
    /// # 参数
    /// - stage_id: 分级阶段ID
    /// - count: 该轮计数 (非负,0表示该轮无鱼)
    /// - notes: 备注
    /// - operator: 操作人
    ///
    /// # 返回
    /// - Ok(SubmitRoundResult): 创建的记录,终轮时附带个体标识提示
    /// - Err(InvalidCount): 计数为负 (校验在任何存储调用之前)
    /// - Err(StageAlreadyComplete): 四轮已全部提交
    pub fn submit_classification_round(
        &self,
        stage_id: &str,
        count: i64,
        notes: Option<String>,
        operator: &str,
    ) -> ApiResult<SubmitRoundResult> {
        let _perf = PerfGuard::new("submit_classification_round");

        // 计数校验必须先于任何存储调用
        if count < 0 {
            return Err(ApiError::InvalidCount(format!("计数不能为负: {}", count)));
        }
        self.validate_note(notes.as_deref())?;
        if stage_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("阶段ID不能为空".to_string()));
        }

        let stage = self
            .repos
            .stage_repo
            .find_by_id(stage_id)?
            .ok_or_else(|| ApiError::NotFound(format!("分级阶段(id={})不存在", stage_id)))?;

        let existing = self.repos.record_repo.count_by_stage(stage_id)?;
        let round = self.sequencer.next_round(existing).map_err(|e| match e {
            SequencerError::StageAlreadyComplete { existing } => ApiError::StageAlreadyComplete {
                stage_id: stage_id.to_string(),
                existing,
            },
        })?;

        let actor = self.resolve_actor(operator);
        let mut record = ClassificationRecord {
            record_id: Uuid::new_v4().to_string(),
            stage_id: stage_id.to_string(),
            round_index: round.round_index(),
            cull_qualified_count: None,
            high_qualified_count: None,
            show_qualified_count: None,
            pond_qualified_count: None,
            notes,
            created_by: actor.clone(),
            created_at: Utc::now().naive_utc(),
        };
        match round.count_field() {
            CountField::CullQualified => record.cull_qualified_count = Some(count),
            CountField::HighQualified => record.high_qualified_count = Some(count),
            CountField::ShowQualified => record.show_qualified_count = Some(count),
            CountField::PondQualified => record.pond_qualified_count = Some(count),
        }

        match self.repos.record_repo.create(&record) {
            Ok(_) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                // 并发提交撞上同一轮次,由存储层唯一约束兜底
                return Err(ApiError::RoundConflict(format!(
                    "阶段{}的第{}轮已被并发提交",
                    stage_id,
                    round.round_no()
                )));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            stage_id = %stage_id,
            round_no = round.round_no(),
            field = round.count_field().column(),
            count,
            is_terminal = round.is_terminal(),
            "提交分级轮次"
        );

        self.log_action(ActionLog::new(
            ActionType::SubmitRound,
            Some(stage.process_id.clone()),
            &actor,
            Some(serde_json::json!({
                "record_id": record.record_id,
                "stage_id": stage_id,
                "round_index": round.round_index(),
                "field": round.count_field().column(),
                "count": count,
            })),
            Some(format!("提交第{}轮筛选: {}", round.round_no(), t(round.label_key()))),
        ));
        self.touch_process(&stage.process_id);

        let message = if round.is_terminal() {
            info!(stage_id = %stage_id, "四轮筛选完成,可开始个体标识流程");
            Some(t("classification.status.ready_for_identification"))
        } else {
            None
        };

        Ok(SubmitRoundResult {
            record,
            round,
            round_no: round.round_no(),
            is_terminal: round.is_terminal(),
            message,
        })
    }

    /// 查询分级阶段状态 ("第 N 轮 / 共 4 轮" + 汇总)
    ///
    /// 阶段已完成时不报错: next_round 为 None,completed 为 true。
    /// 只读操作,连续调用返回相同结果。
    pub fn get_classification_status(&self, stage_id: &str) -> ApiResult<ClassificationStatus> {
        if stage_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("阶段ID不能为空".to_string()));
        }

        let stage = self
            .repos
            .stage_repo
            .find_by_id(stage_id)?
            .ok_or_else(|| ApiError::NotFound(format!("分级阶段(id={})不存在", stage_id)))?;

        let records = self.repos.record_repo.find_by_stage(stage_id)?;
        let existing = records.len();
        let summary = self.aggregator.summarize(stage.total_count, &records);
        let completed = self.sequencer.is_complete(existing);
        let round_no = self.sequencer.display_round_no(existing);
        let next_round = self.sequencer.next_round(existing).ok();

        let status_text = if completed {
            t("classification.status.completed")
        } else {
            t_with_args(
                "classification.status.in_progress",
                &[("round", &round_no.to_string())],
            )
        };

        Ok(ClassificationStatus {
            stage_id: stage_id.to_string(),
            total_count: stage.total_count,
            round_no,
            completed,
            next_round,
            next_field: next_round.map(|r| r.count_field().column().to_string()),
            summary,
            status_text,
        })
    }

    /// 查询阶段的轮次记录 (按轮次排列)
    pub fn list_classification_records(
        &self,
        stage_id: &str,
    ) -> ApiResult<Vec<ClassificationRecord>> {
        Ok(self.repos.record_repo.find_by_stage(stage_id)?)
    }

    // ==========================================
    // 管理性更正与删除
    // ==========================================
    // 独立于正向状态机,用于事后修正录入错误

    /// 更正孵化日记录的累计计数
    pub fn correct_incubation_record(
        &self,
        record_id: &str,
        hatched_count: i64,
        rotten_count: i64,
        note: Option<String>,
        operator: &str,
    ) -> ApiResult<IncubationDailyRecord> {
        if hatched_count < 0 || rotten_count < 0 {
            return Err(ApiError::InvalidCount(format!(
                "累计计数不能为负: hatched={}, rotten={}",
                hatched_count, rotten_count
            )));
        }
        self.validate_note(note.as_deref())?;

        let existing = self
            .repos
            .incubation_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("孵化日记录(id={})不存在", record_id)))?;

        self.repos
            .incubation_repo
            .update_counts(record_id, hatched_count, rotten_count, note.as_deref())?;

        let actor = self.resolve_actor(operator);
        let process_id = self
            .repos
            .egg_batch_repo
            .find_by_id(&existing.batch_id)?
            .map(|b| b.process_id);
        self.log_action(ActionLog::new(
            ActionType::CorrectRecord,
            process_id,
            &actor,
            Some(serde_json::json!({
                "record_id": record_id,
                "before": { "hatched_count": existing.hatched_count, "rotten_count": existing.rotten_count },
                "after": { "hatched_count": hatched_count, "rotten_count": rotten_count },
            })),
            Some("更正孵化日记录".to_string()),
        ));

        Ok(IncubationDailyRecord {
            hatched_count,
            rotten_count,
            note,
            ..existing
        })
    }

    /// 删除孵化日记录
    pub fn delete_incubation_record(&self, record_id: &str, operator: &str) -> ApiResult<()> {
        let existing = self
            .repos
            .incubation_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("孵化日记录(id={})不存在", record_id)))?;

        self.repos.incubation_repo.delete(record_id)?;

        let actor = self.resolve_actor(operator);
        let process_id = self
            .repos
            .egg_batch_repo
            .find_by_id(&existing.batch_id)?
            .map(|b| b.process_id);
        self.log_action(ActionLog::new(
            ActionType::DeleteRecord,
            process_id,
            &actor,
            Some(serde_json::json!({
                "record_id": record_id,
                "batch_id": existing.batch_id,
                "seq": existing.seq,
                "hatched_count": existing.hatched_count,
                "rotten_count": existing.rotten_count,
            })),
            Some("删除孵化日记录".to_string()),
        ));

        Ok(())
    }

    /// 更正鱼苗存活记录的存活数
    pub fn correct_fry_survival_record(
        &self,
        record_id: &str,
        count_alive: i64,
        note: Option<String>,
        operator: &str,
    ) -> ApiResult<FrySurvivalRecord> {
        if count_alive < 0 {
            return Err(ApiError::InvalidCount(format!(
                "存活数不能为负: {}",
                count_alive
            )));
        }
        self.validate_note(note.as_deref())?;

        let existing = self
            .repos
            .survival_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("存活记录(id={})不存在", record_id)))?;

        self.repos
            .survival_repo
            .update_count(record_id, count_alive, note.as_deref())?;

        let actor = self.resolve_actor(operator);
        let process_id = self
            .repos
            .fry_repo
            .find_by_id(&existing.fry_id)?
            .map(|f| f.process_id);
        self.log_action(ActionLog::new(
            ActionType::CorrectRecord,
            process_id,
            &actor,
            Some(serde_json::json!({
                "record_id": record_id,
                "before": { "count_alive": existing.count_alive },
                "after": { "count_alive": count_alive },
            })),
            Some("更正鱼苗存活记录".to_string()),
        ));

        Ok(FrySurvivalRecord {
            count_alive,
            note,
            ..existing
        })
    }

    /// 删除鱼苗存活记录
    pub fn delete_fry_survival_record(&self, record_id: &str, operator: &str) -> ApiResult<()> {
        let existing = self
            .repos
            .survival_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("存活记录(id={})不存在", record_id)))?;

        self.repos.survival_repo.delete(record_id)?;

        let actor = self.resolve_actor(operator);
        let process_id = self
            .repos
            .fry_repo
            .find_by_id(&existing.fry_id)?
            .map(|f| f.process_id);
        self.log_action(ActionLog::new(
            ActionType::DeleteRecord,
            process_id,
            &actor,
            Some(serde_json::json!({
                "record_id": record_id,
                "fry_id": existing.fry_id,
                "seq": existing.seq,
                "day_number": existing.day_number,
                "count_alive": existing.count_alive,
            })),
            Some("删除鱼苗存活记录".to_string()),
        ));

        Ok(())
    }

    /// 更正轮次记录的计数 (字段由记录的轮次决定)
    pub fn correct_classification_count(
        &self,
        record_id: &str,
        value: i64,
        operator: &str,
    ) -> ApiResult<ClassificationRecord> {
        if value < 0 {
            return Err(ApiError::InvalidCount(format!("计数不能为负: {}", value)));
        }

        let existing = self
            .repos
            .record_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("轮次记录(id={})不存在", record_id)))?;

        let round = existing.round().ok_or_else(|| {
            ApiError::InternalError(format!(
                "轮次记录round_index非法: {}",
                existing.round_index
            ))
        })?;
        let field = round.count_field();
        let before = existing.count_for(field);

        self.repos.record_repo.update_count(record_id, field, value)?;

        let actor = self.resolve_actor(operator);
        let process_id = self
            .repos
            .stage_repo
            .find_by_id(&existing.stage_id)?
            .map(|s| s.process_id);
        self.log_action(ActionLog::new(
            ActionType::CorrectRecord,
            process_id,
            &actor,
            Some(serde_json::json!({
                "record_id": record_id,
                "round_index": existing.round_index,
                "field": field.column(),
                "before": before,
                "after": value,
            })),
            Some(format!("更正第{}轮筛选计数", round.round_no())),
        ));

        let mut updated = existing;
        match field {
            CountField::CullQualified => updated.cull_qualified_count = Some(value),
            CountField::HighQualified => updated.high_qualified_count = Some(value),
            CountField::ShowQualified => updated.show_qualified_count = Some(value),
            CountField::PondQualified => updated.pond_qualified_count = Some(value),
        }
        Ok(updated)
    }

    /// 删除轮次记录 (只允许删除最后一轮,保持轮次前缀完整)
    pub fn delete_classification_record(&self, record_id: &str, operator: &str) -> ApiResult<()> {
        let existing = self
            .repos
            .record_repo
            .find_by_id(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("轮次记录(id={})不存在", record_id)))?;

        let max_round = self.repos.record_repo.max_round_index(&existing.stage_id)?;
        if max_round != Some(existing.round_index) {
            return Err(ApiError::BusinessRuleViolation(format!(
                "只能删除最后一轮筛选记录 (该记录为第{}轮,当前最后一轮为第{}轮)",
                existing.round_index + 1,
                max_round.map(|m| m + 1).unwrap_or(0)
            )));
        }

        let removed_count = existing.populated_count();
        self.repos.record_repo.delete(record_id)?;

        let actor = self.resolve_actor(operator);
        let process_id = self
            .repos
            .stage_repo
            .find_by_id(&existing.stage_id)?
            .map(|s| s.process_id);
        self.log_action(ActionLog::new(
            ActionType::DeleteRecord,
            process_id,
            &actor,
            Some(serde_json::json!({
                "record_id": record_id,
                "stage_id": existing.stage_id,
                "round_index": existing.round_index,
                "count": removed_count,
            })),
            Some("删除轮次记录".to_string()),
        ));

        Ok(())
    }
}
