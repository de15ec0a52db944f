// ==========================================
// 锦鲤繁育管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod breeding_process_repo;
pub mod classification_repo;
pub mod egg_batch_repo;
pub mod error;
pub mod fry_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use breeding_process_repo::BreedingProcessRepository;
pub use classification_repo::{ClassificationRecordRepository, ClassificationStageRepository};
pub use egg_batch_repo::{EggBatchRepository, IncubationRecordRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use fry_repo::{FryFishRepository, FrySurvivalRepository};
