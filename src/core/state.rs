//! 状态定义：轮次状态机与 UiState 投影
//!
//! 每条用户输入对应一个 Turn，从 Pending 走到 Committed 或 Failed 的终态；
//! UI 只持有轻量的 UiState（阶段、对话记录、锁、提示），由编排器投影并广播。

use chrono::{DateTime, Utc};
use serde::Serialize;

/// 轮次状态机：Pending -> Generating -> Committed | Failed
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum TurnStatus {
    /// 已接收，回复尚未开始生成（UI 显示占位）
    Pending,
    /// 正在生成回复
    Generating,
    /// 回复已产出并展示
    Committed,
    /// 生成失败，展示道歉消息
    Failed,
}

/// 一轮对话：用户输入与 Agent 回复
#[derive(Clone, Debug, Serialize)]
pub struct Turn {
    pub user_text: String,
    pub status: TurnStatus,
    pub bot_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(user_text: impl Into<String>) -> Self {
        Self {
            user_text: user_text.into(),
            status: TurnStatus::Pending,
            bot_text: None,
            created_at: Utc::now(),
        }
    }

    /// 轮次是否已到终态（Committed 或 Failed）
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TurnStatus::Committed | TurnStatus::Failed)
    }
}

/// Agent 阶段（UI 投影用）
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum AgentPhase {
    Idle,
    Thinking,
    Error,
}

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug, Serialize)]
pub struct UiState {
    pub phase: AgentPhase,
    pub transcript: Vec<Turn>,
    pub active_user: String,
    pub input_locked: bool,
    pub notice: Option<String>,
    /// /memories 命令的查询结果，一次性展示
    pub memory_view: Option<Vec<String>>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            phase: AgentPhase::Idle,
            transcript: Vec::new(),
            active_user: String::new(),
            input_locked: false,
            notice: None,
            memory_view: None,
        }
    }
}
