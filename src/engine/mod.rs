// ==========================================
// 锦鲤繁育管理系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL,纯函数可独立测试
// ==========================================

pub mod classification_summary;
pub mod repositories;
pub mod sequencer;
pub mod survival;

// 重导出核心引擎
pub use classification_summary::{ClassificationSummary, ClassificationSummaryAggregator};
pub use repositories::BreedingRepositories;
pub use sequencer::{ClassificationSequencer, SequencerError};
pub use survival::{FrySurvivalSummary, IncubationSummary, SurvivalCalculator};
