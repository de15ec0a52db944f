// ==========================================
// 锦鲤繁育管理系统 - 分级轮次状态机
// ==========================================
// 职责: 根据已有轮次记录数推导下一轮
// 输入: 阶段已有记录数
// 输出: 下一轮次 (或阶段已完成错误)
// ==========================================
// 红线: 轮次只由记录数决定,调用方不得指定轮次
// ==========================================

use crate::domain::types::ClassificationRound;
use thiserror::Error;

/// 轮次推导错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequencerError {
    /// 四轮已全部提交,阶段终结
    #[error("分级阶段已完成: 已存在{existing}条轮次记录,不允许继续提交")]
    StageAlreadyComplete { existing: usize },
}

// ==========================================
// ClassificationSequencer - 分级轮次状态机
// ==========================================
pub struct ClassificationSequencer {
    // 无状态引擎,不需要注入依赖
    // Repository 操作由调用方处理
}

impl ClassificationSequencer {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 推导下一轮次
    ///
    /// # 参数
    /// - `existing_count`: 阶段下已有的轮次记录数
    ///
    /// # 返回
    /// - `Ok(ClassificationRound)`: 下一轮次
    /// - `Err(StageAlreadyComplete)`: 已有记录数 >= 4
    ///
    /// # 规则
    /// | 已有记录数 | 下一轮 | 填写字段 |
    /// |---|---|---|
    /// | 0 | 第1轮 未达标准 | cull_qualified_count |
    /// | 1 | 第2轮 未达标准 | cull_qualified_count |
    /// | 2 | 第3轮 高品质 | high_qualified_count |
    /// | 3 | 第4轮 参赛级(终轮) | show_qualified_count |
    /// | >=4 | 错误 | - |
    pub fn next_round(&self, existing_count: usize) -> Result<ClassificationRound, SequencerError> {
        ClassificationRound::from_record_count(existing_count).ok_or(
            SequencerError::StageAlreadyComplete {
                existing: existing_count,
            },
        )
    }

    /// 展示用轮次编号: min(已有记录数, 3) + 1
    ///
    /// 仅用于界面显示"第 N 轮 / 共 4 轮",字段映射以 next_round 为准
    pub fn display_round_no(&self, existing_count: usize) -> u32 {
        (existing_count.min(3) + 1) as u32
    }

    /// 阶段是否已终结 (四轮全部提交)
    pub fn is_complete(&self, existing_count: usize) -> bool {
        existing_count >= ClassificationRound::TOTAL_ROUNDS
    }
}

impl Default for ClassificationSequencer {
    fn default() -> Self {
        Self::new()
    }
}
