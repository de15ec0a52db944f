// ==========================================
// 锦鲤繁育管理系统 - 鱼苗领域模型
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// FryFish - 鱼苗批次
// ==========================================
// 与繁育流程一对一; initial_count 创建后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FryFish {
    pub fry_id: String,                  // 鱼苗批次ID
    pub process_id: String,              // 关联繁育流程
    pub initial_count: i64,              // 初始鱼苗数 (创建后不可变)
    pub hatched_date: Option<NaiveDate>, // 孵化完成日期
    pub created_at: NaiveDateTime,       // 创建时间
}

// ==========================================
// FrySurvivalRecord - 鱼苗存活记录
// ==========================================
// count_alive 是当前存活数的绝对快照,不是增量;
// 正常运行下随日龄单调不增 (只有死亡),但引擎不强制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrySurvivalRecord {
    pub record_id: String,         // 记录ID
    pub fry_id: String,            // 关联鱼苗批次
    pub seq: i64,                  // 批内创建顺序 (仓储分配,单调递增)
    pub day_number: i32,           // 孵化后天数
    pub count_alive: i64,          // 当前存活数 (绝对快照)
    pub note: Option<String>,      // 备注
    pub created_at: NaiveDateTime, // 创建时间
}
