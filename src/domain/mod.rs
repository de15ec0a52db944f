// ==========================================
// 锦鲤繁育管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod breeding;
pub mod classification;
pub mod fry;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use breeding::{BreedingProcess, EggBatch, IncubationDailyRecord};
pub use classification::{ClassificationRecord, ClassificationStage};
pub use fry::{FryFish, FrySurvivalRecord};
pub use types::{ClassificationRound, CountField};
