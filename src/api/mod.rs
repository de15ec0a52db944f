// ==========================================
// 锦鲤繁育管理系统 - API层模块
// ==========================================

pub mod breeding_api;
pub mod error;

pub use breeding_api::{
    BreedingApi, BreedingOverview, ClassificationStatus, NextRoundInfo, SubmitRoundResult,
};
pub use error::{ApiError, ApiResult};
