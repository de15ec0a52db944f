// ==========================================
// 锦鲤繁育管理系统 - 存活统计引擎
// ==========================================
// 职责: 孵化汇总与鱼苗存活率计算
// 输入: 批次基数 + 按插入顺序排列的记录历史
// 输出: 孵化汇总 / 存活率汇总
// ==========================================
// 红线: 记录为累计值快照,取最后一条,不跨记录求和
// 红线: 数据异常(健康卵为负等)原样返回,不做修正
// ==========================================

use crate::domain::breeding::IncubationDailyRecord;
use crate::domain::fry::FrySurvivalRecord;
use serde::{Deserialize, Serialize};

// ==========================================
// 汇总结果类型
// ==========================================

/// 孵化汇总
///
/// healthy_eggs 可能为负 (录入不一致时),由调用方决定如何呈现
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncubationSummary {
    pub total_hatched_eggs: i64, // 累计孵化数
    pub total_rotten_eggs: i64,  // 累计坏卵数
    pub healthy_eggs: i64,       // 健康卵 = 总数 - 孵化 - 坏卵
}

/// 鱼苗存活率汇总
///
/// 各字段为 None 表示对应时间点尚无记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrySurvivalSummary {
    pub survival_rate_7_days: Option<f64>,
    pub survival_rate_14_days: Option<f64>,
    pub survival_rate_30_days: Option<f64>,
    pub current_rate: Option<f64>,
}

// ==========================================
// SurvivalCalculator - 存活统计引擎
// ==========================================
pub struct SurvivalCalculator {
    // 无状态引擎,不需要注入依赖
    // Repository 操作由调用方处理
}

impl SurvivalCalculator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 计算孵化汇总
    ///
    /// # 参数
    /// - `quantity`: 鱼卵批次总数
    /// - `records`: 孵化日记录 (插入顺序)
    ///
    /// # 规则
    /// - 每条记录携带截至当日的累计值,取最后一条记录的数值
    /// - 无记录时孵化/坏卵为0,健康卵等于总数
    /// - 健康卵为负时原样返回,不做钳制
    pub fn incubation_summary(
        &self,
        quantity: i64,
        records: &[IncubationDailyRecord],
    ) -> IncubationSummary {
        let (total_hatched, total_rotten) = match records.last() {
            Some(last) => (last.hatched_count, last.rotten_count),
            None => (0, 0),
        };

        IncubationSummary {
            total_hatched_eggs: total_hatched,
            total_rotten_eggs: total_rotten,
            healthy_eggs: quantity - total_hatched - total_rotten,
        }
    }

    /// 计算鱼苗存活率汇总
    ///
    /// # 参数
    /// - `initial_count`: 鱼苗初始数量
    /// - `records`: 存活记录 (插入顺序)
    ///
    /// # 规则
    /// - 第N天存活率 = 100 * day_number<=N 的最后一条记录的count_alive / initial_count
    /// - 该时间点尚无记录时为 None
    /// - 同一day_number多条记录时,后插入者生效
    /// - current_rate 取最后一条记录
    /// - initial_count <= 0 时全部为 None (无法计算比率)
    pub fn fry_survival_summary(
        &self,
        initial_count: i64,
        records: &[FrySurvivalRecord],
    ) -> FrySurvivalSummary {
        if initial_count <= 0 {
            return FrySurvivalSummary {
                survival_rate_7_days: None,
                survival_rate_14_days: None,
                survival_rate_30_days: None,
                current_rate: None,
            };
        }

        FrySurvivalSummary {
            survival_rate_7_days: self.rate_at_or_before(initial_count, records, 7),
            survival_rate_14_days: self.rate_at_or_before(initial_count, records, 14),
            survival_rate_30_days: self.rate_at_or_before(initial_count, records, 30),
            current_rate: records
                .last()
                .map(|r| Self::rate(r.count_alive, initial_count)),
        }
    }

    /// 第N天时间点的存活率: 取 day_number<=N 的最后一条记录
    fn rate_at_or_before(
        &self,
        initial_count: i64,
        records: &[FrySurvivalRecord],
        day: i32,
    ) -> Option<f64> {
        records
            .iter()
            .filter(|r| r.day_number <= day)
            .last()
            .map(|r| Self::rate(r.count_alive, initial_count))
    }

    fn rate(count_alive: i64, initial_count: i64) -> f64 {
        100.0 * count_alive as f64 / initial_count as f64
    }
}

impl Default for SurvivalCalculator {
    fn default() -> Self {
        Self::new()
    }
}
