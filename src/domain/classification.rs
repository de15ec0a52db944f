// ==========================================
// 锦鲤繁育管理系统 - 分级筛选领域模型
// ==========================================
// 红线: 每条筛选记录只填写一个计数字段;
// 一个阶段每个轮次至多一条记录
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ClassificationRound, CountField};

// ==========================================
// ClassificationStage - 分级阶段
// ==========================================
// total_count 为进入筛选的起始鱼数,阶段创建后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationStage {
    pub stage_id: String,                // 阶段ID
    pub process_id: String,              // 关联繁育流程
    pub total_count: i64,                // 起始鱼数 (创建后不可变)
    pub started_date: Option<NaiveDate>, // 开始日期
    pub created_at: NaiveDateTime,       // 创建时间
}

// ==========================================
// ClassificationRecord - 筛选记录
// ==========================================
// 按创建顺序追加; round_index 在创建时由排序器确定并持久化,
// 用于更正定位与 (stage_id, round_index) 唯一约束,
// 下一轮的推导仍以已有记录数为准
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub record_id: String,                 // 记录ID
    pub stage_id: String,                  // 关联分级阶段
    pub round_index: i32,                  // 轮次下标 (0..=3)
    pub cull_qualified_count: Option<i64>, // 未达标准数 (第1/2轮)
    pub high_qualified_count: Option<i64>, // 高品质数 (第3轮)
    pub show_qualified_count: Option<i64>, // 参赛级数 (第4轮)
    pub pond_qualified_count: Option<i64>, // 留塘数 (历史字段,无对应轮次)
    pub notes: Option<String>,             // 备注
    pub created_by: String,                // 记录人
    pub created_at: NaiveDateTime,         // 创建时间
}

impl ClassificationRecord {
    /// 本记录对应的轮次 (由持久化的 round_index 解析)
    pub fn round(&self) -> Option<ClassificationRound> {
        ClassificationRound::from_round_index(self.round_index)
    }

    /// 读取指定计数字段的值
    pub fn count_for(&self, field: CountField) -> Option<i64> {
        match field {
            CountField::CullQualified => self.cull_qualified_count,
            CountField::HighQualified => self.high_qualified_count,
            CountField::ShowQualified => self.show_qualified_count,
            CountField::PondQualified => self.pond_qualified_count,
        }
    }

    /// 本记录实际填写的计数值 (按本轮的权威字段读取)
    pub fn populated_count(&self) -> Option<i64> {
        self.round().and_then(|r| self.count_for(r.count_field()))
    }
}
