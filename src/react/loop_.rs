//! 有界推理循环
//!
//! 每轮：模型在「选一个工具」与「给出最终回答」之间二选一；工具失败折叠为
//! Observation 写回对话供下一轮参考，绝不因单个工具失败中止。轮数达到
//! max_iterations 仍无最终回答时强制终止，返回携带最后输出的
//! IterationLimitExceeded——这是防止模型失控循环的核心正确性约束。
//! 循环跨调用无状态：除工具持久化的副作用外，不保留任何推理状态。

use crate::core::AgentError;
use crate::llm::Message;
use crate::react::{parse_llm_output, Planner, PlannerOutput};
use crate::tools::{ToolContext, ToolExecutor};

/// 强制终止消息中最后输出的预览字符数
const LAST_OUTPUT_PREVIEW_CHARS: usize = 400;

/// 推理循环执行结果：最终回复与实际消耗轮数
#[derive(Debug)]
pub struct ReactResult {
    pub response: String,
    pub rounds: usize,
}

fn preview(s: &str) -> String {
    if s.chars().count() > LAST_OUTPUT_PREVIEW_CHARS {
        let cut: String = s.chars().take(LAST_OUTPUT_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

/// 拼接循环用 system prompt：人设 + 工具目录 + 调用格式
fn build_system(planner: &Planner, executor: &ToolExecutor) -> String {
    let mut catalog = String::new();
    for (name, desc) in executor.tool_descriptions() {
        catalog.push_str(&format!("- {}: {}\n", name, desc));
    }
    format!(
        "{}\n\nAvailable tools:\n{}\nTools schema:\n{}\nTool call format:\n{}\n\n\
         To call a tool, reply with a single JSON object {{\"tool\": \"name\", \"args\": {{...}}}} and nothing else.\n\
         To answer the user, reply with plain text.",
        planner.base_system_prompt(),
        catalog,
        executor.tools_schema_json(),
        crate::tools::tool_call_schema_json(),
    )
}

/// 执行有界推理循环
///
/// 用户输入 -> plan -> 解析输出 -> 若 ToolCall 则执行并把 Observation 写回 ->
/// 若 Response 则返回；至多 max_iterations 轮。
pub async fn reasoning_loop(
    planner: &Planner,
    executor: &ToolExecutor,
    ctx: &ToolContext,
    user_input: &str,
    max_iterations: usize,
) -> Result<ReactResult, AgentError> {
    let system = build_system(planner, executor);
    let mut messages = vec![Message::user(user_input.to_string())];
    let mut last_output = String::new();

    for round in 0..max_iterations {
        // GenerationError 直接向上传播：模型不可用时本轮次失败
        let output = planner.plan_with_system(&messages, &system).await?;
        last_output = output.clone();

        match parse_llm_output(&output) {
            Ok(PlannerOutput::Response(resp)) => {
                return Ok(ReactResult {
                    response: resp,
                    rounds: round + 1,
                });
            }
            Ok(PlannerOutput::ToolCall(tc)) => {
                // 未知工具、坏参数、后端失败都只产生 Observation，循环自行降级
                let observation = match executor.execute(&tc.tool, ctx, tc.args.clone()).await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(tool = %tc.tool, "tool call failed: {}", e);
                        format!("Error: {}", e)
                    }
                };
                messages.push(Message::assistant(format!(
                    "Tool call: {} | Result: {}",
                    tc.tool, observation
                )));
                messages.push(Message::user(format!(
                    "Observation from {}: {}",
                    tc.tool, observation
                )));
            }
            Err(AgentError::JsonParseError(e)) => {
                messages.push(Message::user(format!(
                    "Your last reply was not a valid tool call ({}). Reply with a single \
                     {{\"tool\", \"args\"}} JSON object, or answer the user in plain text.",
                    e
                )));
            }
            Err(e) => return Err(e),
        }
    }

    Err(AgentError::IterationLimitExceeded(format!(
        "no final answer after {} rounds; last output: {}",
        max_iterations,
        preview(&last_output)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::memory::{InMemoryBackend, MemoryStore};
    use crate::tools::{CurrentTimeTool, StoreMemoryTool, ToolRegistry};
    use std::sync::Arc;

    fn executor() -> ToolExecutor {
        let store = Arc::new(MemoryStore::new(Arc::new(InMemoryBackend::new()), 8000));
        let mut registry = ToolRegistry::new();
        registry.register(CurrentTimeTool);
        registry.register(StoreMemoryTool::new(store));
        ToolExecutor::new(registry, 5)
    }

    #[tokio::test]
    async fn test_final_answer_on_first_round() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            "You are doing your best.".to_string(),
        ]));
        let planner = Planner::new(llm, "persona");
        let result = reasoning_loop(
            &planner,
            &executor(),
            &ToolContext::new("u"),
            "hi",
            4,
        )
        .await
        .unwrap();
        assert_eq!(result.response, "You are doing your best.");
        assert_eq!(result.rounds, 1);
    }

    #[tokio::test]
    async fn test_tool_then_answer() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            r#"{"tool": "current_time", "args": {}}"#.to_string(),
            "It is getting late, let's wrap up.".to_string(),
        ]));
        let planner = Planner::new(llm, "persona");
        let result = reasoning_loop(
            &planner,
            &executor(),
            &ToolContext::new("u"),
            "what time is it",
            4,
        )
        .await
        .unwrap();
        assert_eq!(result.rounds, 2);
        assert!(result.response.contains("wrap up"));
    }

    #[tokio::test]
    async fn test_unknown_tool_degrades_to_observation() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            r#"{"tool": "no_such_tool", "args": {}}"#.to_string(),
            "Answer after recovering.".to_string(),
        ]));
        let planner = Planner::new(llm, "persona");
        let result = reasoning_loop(
            &planner,
            &executor(),
            &ToolContext::new("u"),
            "hi",
            4,
        )
        .await
        .unwrap();
        assert_eq!(result.response, "Answer after recovering.");
    }

    #[tokio::test]
    async fn test_forced_termination_at_cap() {
        // 模型永远选择工具：脚本每轮都给 tool call
        let llm = Arc::new(MockLlmClient::with_script(vec![
            r#"{"tool": "current_time", "args": {}}"#.to_string(),
            r#"{"tool": "current_time", "args": {}}"#.to_string(),
            r#"{"tool": "current_time", "args": {}}"#.to_string(),
        ]));
        let planner = Planner::new(llm, "persona");
        let err = reasoning_loop(
            &planner,
            &executor(),
            &ToolContext::new("u"),
            "hi",
            2,
        )
        .await
        .unwrap_err();
        match err {
            AgentError::IterationLimitExceeded(msg) => assert!(msg.contains("2 rounds")),
            other => panic!("expected iteration limit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_output_gets_correction_round() {
        let llm = Arc::new(MockLlmClient::with_script(vec![
            r#"{"tool": "store_memory", "args": }"#.to_string(),
            "Recovered answer.".to_string(),
        ]));
        let planner = Planner::new(llm, "persona");
        let result = reasoning_loop(
            &planner,
            &executor(),
            &ToolContext::new("u"),
            "hi",
            4,
        )
        .await
        .unwrap();
        assert_eq!(result.response, "Recovered answer.");
        assert_eq!(result.rounds, 2);
    }
}
