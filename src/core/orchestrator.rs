//! Agent 编排器：主控循环
//!
//! 负责：加载配置、装配 Agent 组件、建立 cmd/state 双通道，并在后台任务中
//! 消费用户命令（Submit/SwitchUser/ListMemories/Clear/Quit）。Submit 在等待
//! 生成之前先广播带 Pending 轮次的快照，UI 据此渲染占位，再在终态后广播结果。

use std::path::PathBuf;

use tokio::sync::{mpsc, watch};

use crate::agent::{create_agent_components, Agent};
use crate::config::{load_config, AppConfig};
use crate::core::{AgentPhase, Turn, TurnStatus, UiState};

/// 从 UI 发往编排器的用户命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 提交用户输入，触发一轮生成
    Submit(String),
    /// 切换当前用户身份
    SwitchUser(String),
    /// 查询当前用户的全部记忆
    ListMemories,
    /// 清空对话记录（记忆保留）
    Clear,
    /// 退出应用
    Quit,
}

fn snapshot(agent: &Agent, phase: AgentPhase, notice: Option<String>) -> UiState {
    UiState {
        phase,
        transcript: agent.transcript().to_vec(),
        active_user: agent.active_user().to_string(),
        input_locked: false,
        notice,
        memory_view: None,
    }
}

/// 创建 Agent 运行时：返回命令发送端与状态接收端；后台任务消费命令并更新 state。
pub async fn create_agent(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(mpsc::UnboundedSender<Command>, watch::Receiver<UiState>)> {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let components = create_agent_components(&cfg);
    let mut agent = Agent::new(components, cfg.app.default_user.clone());

    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(snapshot(&agent, AgentPhase::Idle, None));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(cmd) = cmd_rx.recv() => {
                    match cmd {
                        Command::Submit(input) => {
                            // 先广播 Pending 轮次与 Thinking 阶段，UI 渲染占位
                            let mut pending = snapshot(&agent, AgentPhase::Thinking, None);
                            pending.transcript.push(Turn::new(input.clone()));
                            pending.input_locked = true;
                            let _ = state_tx.send(pending);

                            let turn = agent.submit(&input).await;
                            let phase = if turn.status == TurnStatus::Failed {
                                AgentPhase::Error
                            } else {
                                AgentPhase::Idle
                            };
                            let _ = state_tx.send(snapshot(&agent, phase, None));
                        }
                        Command::SwitchUser(user_id) => {
                            agent.switch_user(&user_id);
                            let notice = format!("Switched to user '{}'", agent.active_user());
                            let _ = state_tx.send(snapshot(&agent, AgentPhase::Idle, Some(notice)));
                        }
                        Command::ListMemories => {
                            let records = agent.list_memories().await;
                            let mut state = snapshot(&agent, AgentPhase::Idle, None);
                            state.memory_view = Some(
                                records.into_iter().map(|r| r.content).collect(),
                            );
                            let _ = state_tx.send(state);
                        }
                        Command::Clear => {
                            agent.clear_transcript();
                            let _ = state_tx.send(snapshot(&agent, AgentPhase::Idle, None));
                        }
                        Command::Quit => break,
                    }
                }
                else => break,  // cmd_tx 已关闭，退出循环
            }
        }
    });

    Ok((cmd_tx, state_rx))
}
