//! Mock LLM 客户端（测试与无 API Key 运行用）
//!
//! 可用 with_script 预置一串输出（测试里驱动工具调用序列）；脚本耗尽或未预置时
//! 回显最后一条 User 消息，便于无 Key 跑通完整轮次流程。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, Message, Role};

/// Mock 客户端：按脚本出队，否则回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockLlmClient {
    script: Mutex<VecDeque<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置输出序列，complete 每次弹出一条
    pub fn with_script(outputs: Vec<String>) -> Self {
        Self {
            script: Mutex::new(outputs.into()),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        if let Some(next) = self.script.lock().map_err(|e| e.to_string())?.pop_front() {
            return Ok(next);
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        Ok(format!("I hear you: {}", last_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_echo() {
        let mock = MockLlmClient::with_script(vec!["first".to_string()]);
        assert_eq!(mock.complete(&[Message::user("hi")]).await.unwrap(), "first");
        assert_eq!(
            mock.complete(&[Message::user("hi")]).await.unwrap(),
            "I hear you: hi"
        );
    }
}
