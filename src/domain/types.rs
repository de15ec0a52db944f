// ==========================================
// 锦鲤繁育管理系统 - 领域类型定义
// ==========================================
// 红线: 轮次由已有记录数推导,调用方不得指定
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 分级轮次 (Classification Round)
// ==========================================
// 四轮筛选固定顺序: 两轮淘汰 → 高品质 → 参赛级
// 顺序: Cull1 < Cull2 < High < Show
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationRound {
    #[serde(rename = "CULL_1")]
    Cull1, // 第一轮淘汰 (未达标准)
    #[serde(rename = "CULL_2")]
    Cull2, // 第二轮淘汰 (未达标准)
    High,  // 高品质筛选
    Show,  // 参赛级筛选 (终轮)
}

impl fmt::Display for ClassificationRound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationRound::Cull1 => write!(f, "CULL_1"),
            ClassificationRound::Cull2 => write!(f, "CULL_2"),
            ClassificationRound::High => write!(f, "HIGH"),
            ClassificationRound::Show => write!(f, "SHOW"),
        }
    }
}

impl ClassificationRound {
    /// 总轮次数 (固定四轮)
    pub const TOTAL_ROUNDS: usize = 4;

    /// 由已有记录数推导下一轮
    ///
    /// # 规则
    /// - 0 条 → Cull1, 1 条 → Cull2, 2 条 → High, 3 条 → Show
    /// - ≥4 条 → None (四轮已全部完成)
    pub fn from_record_count(existing_record_count: usize) -> Option<Self> {
        match existing_record_count {
            0 => Some(ClassificationRound::Cull1),
            1 => Some(ClassificationRound::Cull2),
            2 => Some(ClassificationRound::High),
            3 => Some(ClassificationRound::Show),
            _ => None,
        }
    }

    /// 由轮次下标解析 (0..=3)
    pub fn from_round_index(round_index: i32) -> Option<Self> {
        match round_index {
            0 => Some(ClassificationRound::Cull1),
            1 => Some(ClassificationRound::Cull2),
            2 => Some(ClassificationRound::High),
            3 => Some(ClassificationRound::Show),
            _ => None,
        }
    }

    /// 轮次下标 (0..=3, 与记录持久化的 round_index 对齐)
    pub fn round_index(&self) -> i32 {
        match self {
            ClassificationRound::Cull1 => 0,
            ClassificationRound::Cull2 => 1,
            ClassificationRound::High => 2,
            ClassificationRound::Show => 3,
        }
    }

    /// 轮次序号 (1..=4, 用于展示"第 N 轮")
    pub fn round_no(&self) -> u32 {
        (self.round_index() + 1) as u32
    }

    /// 本轮填写的计数字段 (权威派发表)
    ///
    /// 注: 留塘数 (PondQualified) 不是任何轮次的目标字段,
    /// 仅为记录结构的历史字段保留。
    pub fn count_field(&self) -> CountField {
        match self {
            ClassificationRound::Cull1 => CountField::CullQualified,
            ClassificationRound::Cull2 => CountField::CullQualified,
            ClassificationRound::High => CountField::HighQualified,
            ClassificationRound::Show => CountField::ShowQualified,
        }
    }

    /// 是否终轮 (参赛级轮完成后可进入个体标识流程)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClassificationRound::Show)
    }

    /// 轮次名称的 i18n 键
    pub fn label_key(&self) -> &'static str {
        match self {
            ClassificationRound::Cull1 => "classification.round.cull_1",
            ClassificationRound::Cull2 => "classification.round.cull_2",
            ClassificationRound::High => "classification.round.high",
            ClassificationRound::Show => "classification.round.show",
        }
    }

}

// ==========================================
// 计数字段 (Count Field)
// ==========================================
// 每条筛选记录只填写其中一个字段,其余置空
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountField {
    CullQualified, // 未达标准数 (第1/2轮)
    HighQualified, // 高品质数 (第3轮)
    ShowQualified, // 参赛级数 (第4轮)
    PondQualified, // 留塘数 (历史字段,无对应轮次)
}

impl fmt::Display for CountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountField::CullQualified => write!(f, "CULL_QUALIFIED"),
            CountField::HighQualified => write!(f, "HIGH_QUALIFIED"),
            CountField::ShowQualified => write!(f, "SHOW_QUALIFIED"),
            CountField::PondQualified => write!(f, "POND_QUALIFIED"),
        }
    }
}

impl CountField {
    /// 对应的记录字段名 (与数据库列名一致)
    pub fn column(&self) -> &'static str {
        match self {
            CountField::CullQualified => "cull_qualified_count",
            CountField::HighQualified => "high_qualified_count",
            CountField::ShowQualified => "show_qualified_count",
            CountField::PondQualified => "pond_qualified_count",
        }
    }
}
