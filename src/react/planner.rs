//! Planner：意图规划与 Tool Call 解析
//!
//! 调用 LLM 得到回复或 JSON Tool Call；parse_llm_output 从文本中提取 JSON 并解析为
//! ToolCall 或直接回复。带花括号但无 "tool" 键的普通文本按直接回复处理，
//! 只有疑似工具调用却解析失败时才报 JsonParseError。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};

/// LLM 返回的 Tool Call（简化 JSON：{"tool": "track_mood", "args": {"mood": "..."}}）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Planner 输出
#[derive(Debug, Clone)]
pub enum PlannerOutput {
    /// 直接回复用户
    Response(String),
    /// 需要执行工具
    ToolCall(ToolCall),
}

/// 解析 LLM 输出：若含有效 JSON 且 tool 非空则为 ToolCall，否则为 Response
pub fn parse_llm_output(output: &str) -> Result<PlannerOutput, AgentError> {
    let trimmed = output.trim();

    // 尝试提取 JSON 块（```json ... ``` 或纯 JSON）
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or(rest.trim())
    } else if let Some(start) = trimmed.find('{') {
        match trimmed.rfind('}') {
            Some(end) if end > start => &trimmed[start..=end],
            // 末个 } 在首个 { 之前：没有可解析的 JSON 块，按普通文本处理
            Some(_) => return Ok(PlannerOutput::Response(trimmed.to_string())),
            None => trimmed,
        }
    } else {
        return Ok(PlannerOutput::Response(trimmed.to_string()));
    };

    match serde_json::from_str::<ToolCall>(json_str) {
        Ok(parsed) if !parsed.tool.is_empty() => Ok(PlannerOutput::ToolCall(parsed)),
        Ok(_) => Ok(PlannerOutput::Response(trimmed.to_string())),
        // 带花括号的普通句子不算格式错误
        Err(_) if !json_str.contains("\"tool\"") => {
            Ok(PlannerOutput::Response(trimmed.to_string()))
        }
        Err(e) => Err(AgentError::JsonParseError(format!("{}: {}", e, json_str))),
    }
}

/// Planner：持有 LLM 与 system prompt，负责 plan / plan_with_system
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>, system_prompt: impl Into<String>) -> Self {
        Self {
            llm,
            system_prompt: system_prompt.into(),
        }
    }

    pub fn base_system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// 获取 LLM 累计 token 使用统计
    pub fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }

    /// 使用动态拼接的 system（含工具目录、记忆上下文等）
    pub async fn plan_with_system(
        &self,
        messages: &[Message],
        system: &str,
    ) -> Result<String, AgentError> {
        let mut full_messages = vec![Message::system(system.to_string())];
        full_messages.extend(messages.to_vec());
        self.llm
            .complete(&full_messages)
            .await
            .map_err(AgentError::Generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_response() {
        let out = parse_llm_output("That sounds really difficult.").unwrap();
        assert!(matches!(out, PlannerOutput::Response(_)));
    }

    #[test]
    fn test_parse_tool_call() {
        let out = parse_llm_output(r#"{"tool": "current_time", "args": {}}"#).unwrap();
        match out {
            PlannerOutput::ToolCall(tc) => assert_eq!(tc.tool, "current_time"),
            _ => panic!("expected tool call"),
        }
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let out =
            parse_llm_output("```json\n{\"tool\": \"track_mood\", \"args\": {\"mood\": \"low\", \"intensity\": 3}}\n```")
                .unwrap();
        assert!(matches!(out, PlannerOutput::ToolCall(_)));
    }

    #[test]
    fn test_braces_without_tool_key_is_response() {
        let out = parse_llm_output("Try writing {your thought} down first.").unwrap();
        assert!(matches!(out, PlannerOutput::Response(_)));
    }

    #[test]
    fn test_closing_brace_before_opening_brace_is_response() {
        // 末个 } 在首个 { 之前，不能当作 JSON 块去切片
        let out = parse_llm_output("} hmm, an opening brace: {").unwrap();
        assert!(matches!(out, PlannerOutput::Response(_)));
    }

    #[test]
    fn test_unclosed_tool_call_is_parse_error() {
        let err = parse_llm_output(r#"{"tool": "store_memory", "args":"#).unwrap_err();
        assert!(matches!(err, AgentError::JsonParseError(_)));
    }

    #[test]
    fn test_malformed_tool_call_is_parse_error() {
        let err = parse_llm_output(r#"{"tool": "store_memory", "args": }"#).unwrap_err();
        assert!(matches!(err, AgentError::JsonParseError(_)));
    }
}
