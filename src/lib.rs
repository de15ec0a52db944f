// ==========================================
// 锦鲤繁育管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 繁育流程引擎 (分级筛选状态机 + 存活统计)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 性能观测（SQL 计数与慢查询）
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装与启动
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ClassificationRound, CountField};

// 领域实体
pub use domain::{
    ActionLog, ActionType, BreedingProcess, ClassificationRecord, ClassificationStage, EggBatch,
    FryFish, FrySurvivalRecord, IncubationDailyRecord,
};

// 引擎
pub use engine::{
    ClassificationSequencer, ClassificationSummary, ClassificationSummaryAggregator,
    FrySurvivalSummary, IncubationSummary, SequencerError, SurvivalCalculator,
};

// API
pub use api::{ApiError, ApiResult, BreedingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "锦鲤繁育管理系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================
