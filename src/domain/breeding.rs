// ==========================================
// 锦鲤繁育管理系统 - 繁育流程领域模型
// ==========================================
// 繁育流程是根聚合: 一次配对产卵对应一个鱼卵批次、
// 一个鱼苗批次和一个分级阶段
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// BreedingProcess - 繁育流程
// ==========================================
// 红线: 本引擎只读父聚合,不修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingProcess {
    pub process_id: String,               // 流程ID
    pub process_name: String,             // 流程名称 (如 "2026春·红白1号池")
    pub father_koi: Option<String>,       // 父本编号
    pub mother_koi: Option<String>,       // 母本编号
    pub spawning_date: Option<NaiveDate>, // 产卵日期
    pub created_by: String,               // 创建人
    pub created_at: NaiveDateTime,        // 创建时间
    pub updated_at: NaiveDateTime,        // 更新时间
}

// ==========================================
// EggBatch - 鱼卵批次
// ==========================================
// quantity 在创建时固定,之后唯一可变的派生状态是孵化日记录历史
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EggBatch {
    pub batch_id: String,             // 批次ID
    pub process_id: String,           // 关联繁育流程
    pub quantity: i64,                // 产卵总数 (创建后不可变)
    pub laid_date: Option<NaiveDate>, // 产卵日期
    pub created_at: NaiveDateTime,    // 创建时间
}

// ==========================================
// IncubationDailyRecord - 孵化日记录
// ==========================================
// 按创建顺序追加; hatched_count / rotten_count 为截至当日的累计值,
// 不是当日增量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncubationDailyRecord {
    pub record_id: String,         // 记录ID
    pub batch_id: String,          // 关联鱼卵批次
    pub seq: i64,                  // 批内创建顺序 (仓储分配,单调递增)
    pub record_date: NaiveDate,    // 记录日期
    pub hatched_count: i64,        // 累计孵化数
    pub rotten_count: i64,         // 累计坏卵数
    pub note: Option<String>,      // 备注
    pub created_at: NaiveDateTime, // 创建时间
}
