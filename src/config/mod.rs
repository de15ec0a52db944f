// ==========================================
// 锦鲤繁育管理系统 - 配置层
// ==========================================
// 职责: 配置读写与默认值管理
// ==========================================

pub mod config_manager;

// 重导出
pub use config_manager::{config_keys, ConfigManager};
