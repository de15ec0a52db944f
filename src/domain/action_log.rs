// ==========================================
// 锦鲤繁育管理系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写入必须记录
// 用途: 审计追踪,事后追溯筛选/更正历史
// ==========================================

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,          // 日志ID
    pub process_id: Option<String>, // 关联繁育流程 (系统级操作可为 None)
    pub action_type: String,        // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,   // 操作时间戳
    pub actor: String,              // 操作人
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,     // 详细描述
}

impl ActionLog {
    /// 构造一条新日志 (自动分配ID与时间戳)
    pub fn new(
        action_type: ActionType,
        process_id: Option<String>,
        actor: &str,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: Uuid::new_v4().to_string(),
            process_id,
            action_type: action_type.as_str().to_string(),
            action_ts: Utc::now().naive_utc(),
            actor: actor.to_string(),
            payload_json,
            detail,
        }
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateProcess,   // 创建繁育流程
    CreateEggBatch,  // 创建鱼卵批次
    RecordIncubation,// 记录孵化日数据
    CreateFryBatch,  // 创建鱼苗批次
    RecordSurvival,  // 记录鱼苗存活
    CreateStage,     // 创建分级阶段
    SubmitRound,     // 提交筛选轮次
    CorrectRecord,   // 管理性更正
    DeleteRecord,    // 管理性删除
}

// ==========================================
// ActionType 辅助方法
// ==========================================
impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateProcess => "CreateProcess",
            ActionType::CreateEggBatch => "CreateEggBatch",
            ActionType::RecordIncubation => "RecordIncubation",
            ActionType::CreateFryBatch => "CreateFryBatch",
            ActionType::RecordSurvival => "RecordSurvival",
            ActionType::CreateStage => "CreateStage",
            ActionType::SubmitRound => "SubmitRound",
            ActionType::CorrectRecord => "CorrectRecord",
            ActionType::DeleteRecord => "DeleteRecord",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreateProcess" => Some(ActionType::CreateProcess),
            "CreateEggBatch" => Some(ActionType::CreateEggBatch),
            "RecordIncubation" => Some(ActionType::RecordIncubation),
            "CreateFryBatch" => Some(ActionType::CreateFryBatch),
            "RecordSurvival" => Some(ActionType::RecordSurvival),
            "CreateStage" => Some(ActionType::CreateStage),
            "SubmitRound" => Some(ActionType::SubmitRound),
            "CorrectRecord" => Some(ActionType::CorrectRecord),
            "DeleteRecord" => Some(ActionType::DeleteRecord),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_roundtrip() {
        let all = [
            ActionType::CreateProcess,
            ActionType::CreateEggBatch,
            ActionType::RecordIncubation,
            ActionType::CreateFryBatch,
            ActionType::RecordSurvival,
            ActionType::CreateStage,
            ActionType::SubmitRound,
            ActionType::CorrectRecord,
            ActionType::DeleteRecord,
        ];
        for t in all {
            assert_eq!(ActionType::from_str(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::from_str("Unknown"), None);
    }

    #[test]
    fn test_action_log_new() {
        let log = ActionLog::new(
            ActionType::SubmitRound,
            Some("P001".to_string()),
            "tester",
            None,
            Some("第3轮筛选".to_string()),
        );
        assert!(!log.action_id.is_empty());
        assert_eq!(log.action_type, "SubmitRound");
        assert_eq!(log.actor, "tester");
        assert_eq!(log.process_id.as_deref(), Some("P001"));
    }
}
