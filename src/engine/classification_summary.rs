// ==========================================
// 锦鲤繁育管理系统 - 分级汇总引擎
// ==========================================
// 职责: 从轮次记录历史推导聚合数字
// 输入: 阶段起始总数 + 按轮次排列的记录历史
// 输出: 当前鱼数 / 高品质数 / 参赛级数
// ==========================================
// 红线: 三项指标互相独立,部分汇总是合法中间态
// ==========================================

use crate::domain::classification::ClassificationRecord;
use crate::domain::types::ClassificationRound;
use serde::{Deserialize, Serialize};

/// 分级汇总
///
/// total_high_qualified / total_show_qualified 为 None 表示对应轮次尚未提交
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub current_fish: i64,                  // 当前鱼数 = 总数 - 两轮淘汰数
    pub total_high_qualified: Option<i64>,  // 高品质数 (第3轮)
    pub total_show_qualified: Option<i64>,  // 参赛级数 (第4轮)
}

// ==========================================
// ClassificationSummaryAggregator - 分级汇总引擎
// ==========================================
pub struct ClassificationSummaryAggregator {
    // 无状态引擎,不需要注入依赖
    // Repository 操作由调用方处理
}

impl ClassificationSummaryAggregator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算分级汇总
    ///
    /// # 参数
    /// - `total_count`: 进入分级的起始总数
    /// - `records`: 轮次记录 (按轮次排列)
    ///
    /// # 规则
    /// - current_fish = total_count - 所有淘汰轮记录的cull_qualified_count之和
    /// - 高品质/参赛级数取对应轮次记录的字段,轮次未提交时为 None
    /// - 无记录时 current_fish 等于 total_count
    pub fn summarize(
        &self,
        total_count: i64,
        records: &[ClassificationRecord],
    ) -> ClassificationSummary {
        let culled: i64 = records.iter().filter_map(|r| r.cull_qualified_count).sum();

        ClassificationSummary {
            current_fish: total_count - culled,
            total_high_qualified: self.count_for_round(records, ClassificationRound::High),
            total_show_qualified: self.count_for_round(records, ClassificationRound::Show),
        }
    }

    /// 取指定轮次记录的计数字段
    fn count_for_round(
        &self,
        records: &[ClassificationRecord],
        round: ClassificationRound,
    ) -> Option<i64> {
        records
            .iter()
            .find(|r| r.round_index == round.round_index())
            .and_then(|r| r.count_for(round.count_field()))
    }
}

impl Default for ClassificationSummaryAggregator {
    fn default() -> Self {
        Self::new()
    }
}
