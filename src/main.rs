//! Solace - CBT 记忆增强陪伴智能体
//!
//! 入口：初始化日志、创建 Agent 编排器，并运行命令行 REPL 主循环。

use anyhow::Context;
use solace::core::{create_agent, Command, UiState};
use solace::observability;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    observability::init();

    let _ = std::fs::create_dir_all("config/prompts");

    let (cmd_tx, mut state_rx) = create_agent(None).await.context("Failed to create agent")?;

    let user = state_rx.borrow().active_user.clone();
    println!("Solace - a space to talk things through.");
    println!("Commands: /user <id>, /memories, /clear, /quit");
    println!("(current user: {})\n", user);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(user_id) = input.strip_prefix("/user ") {
            cmd_tx.send(Command::SwitchUser(user_id.trim().to_string()))?;
            state_rx.changed().await?;
            if let Some(notice) = &state_rx.borrow().notice {
                println!("{}\n", notice);
            }
        } else if input == "/memories" {
            cmd_tx.send(Command::ListMemories)?;
            state_rx.changed().await?;
            print_memories(&state_rx.borrow());
        } else if input == "/clear" {
            cmd_tx.send(Command::Clear)?;
            state_rx.changed().await?;
            println!("Conversation cleared.\n");
        } else if input == "/quit" {
            cmd_tx.send(Command::Quit)?;
            break;
        } else {
            cmd_tx.send(Command::Submit(input.to_string()))?;
            wait_for_reply(&mut state_rx).await?;
        }
    }

    Ok(())
}

/// 等到最新轮次到达终态，打印占位与回复
async fn wait_for_reply(state_rx: &mut watch::Receiver<UiState>) -> anyhow::Result<()> {
    let mut placeholder_shown = false;
    loop {
        state_rx.changed().await?;
        let state = state_rx.borrow().clone();
        let Some(turn) = state.transcript.last() else {
            continue;
        };
        if turn.is_terminal() {
            if let Some(text) = &turn.bot_text {
                println!("{}\n", text);
            }
            return Ok(());
        }
        if !placeholder_shown {
            println!("Typing...");
            placeholder_shown = true;
        }
    }
}

fn print_memories(state: &UiState) {
    match &state.memory_view {
        Some(memories) if !memories.is_empty() => {
            println!("Memories for {}:", state.active_user);
            for (i, m) in memories.iter().enumerate() {
                println!("  {}. {}", i + 1, m);
            }
            println!();
        }
        _ => println!("No memories stored for {}.\n", state.active_user),
    }
}
