//! 单次检索增强生成
//!
//! 不需要工具能力时的回复路径：检索 -> 拼上下文块 -> 调一次 LLM。检索失败降级为
//! 「无记忆」标记而非中止轮次；记忆写入不在这里做，由编排层在回复展示后延迟执行。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};
use crate::memory::{MemoryRecord, MemoryStore};

/// 检索增强生成器：search -> augmented prompt -> complete
pub struct RagGenerator {
    llm: Arc<dyn LlmClient>,
    store: Arc<MemoryStore>,
    persona: String,
    search_limit: usize,
}

impl RagGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: Arc<MemoryStore>,
        persona: impl Into<String>,
        search_limit: usize,
    ) -> Self {
        Self {
            llm,
            store,
            persona: persona.into(),
            search_limit,
        }
    }

    /// 渲染记忆上下文块；空结果与检索失败都有显式标记
    fn memory_block(records: &[MemoryRecord]) -> String {
        if records.is_empty() {
            return "(no stored memories for this user)".to_string();
        }
        let mut block = String::from("Memories of the user retrieved from the database:\n");
        for (i, r) in records.iter().enumerate() {
            match r.relevance_score {
                Some(score) => {
                    block.push_str(&format!("{}. (relevance {:.2}) {}\n", i + 1, score, r.content))
                }
                None => block.push_str(&format!("{}. {}\n", i + 1, r.content)),
            }
        }
        block
    }

    /// 生成一条回复；检索先于生成，模型输出原样返回
    pub async fn generate(&self, user_input: &str, user_id: &str) -> Result<String, AgentError> {
        let block = match self.store.search(user_input, user_id, self.search_limit).await {
            Ok(records) => Self::memory_block(&records),
            Err(e) => {
                tracing::warn!("memory retrieval failed, continuing without memories: {}", e);
                "(no memories available)".to_string()
            }
        };

        let system = format!("{}\n\n[Memory context]\n{}", self.persona, block);
        let messages = [
            Message::system(system),
            Message::user(user_input.to_string()),
        ];
        self.llm
            .complete(&messages)
            .await
            .map_err(AgentError::Generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;
    use crate::memory::{InMemoryBackend, MemoryBackend};
    use async_trait::async_trait;
    use serde_json::Value;

    #[tokio::test]
    async fn test_generate_returns_llm_output_verbatim() {
        let store = Arc::new(MemoryStore::new(Arc::new(InMemoryBackend::new()), 8000));
        store.store("enjoys morning walks", "u").await.unwrap();

        let llm = Arc::new(MockLlmClient::with_script(vec!["A calm reply.".to_string()]));
        let gen = RagGenerator::new(llm, store, "persona", 1);
        assert_eq!(gen.generate("walks", "u").await.unwrap(), "A calm reply.");
    }

    struct BrokenBackend;

    #[async_trait]
    impl MemoryBackend for BrokenBackend {
        async fn add(&self, _c: &str, _u: &str) -> Result<Value, String> {
            Err("backend down".to_string())
        }

        async fn search(&self, _q: &str, _u: &str, _l: usize) -> Result<Value, String> {
            Err("backend down".to_string())
        }

        async fn get_all(&self, _u: &str) -> Result<Value, String> {
            Err("backend down".to_string())
        }
    }

    #[tokio::test]
    async fn test_retrieval_failure_degrades_not_aborts() {
        let store = Arc::new(MemoryStore::new(Arc::new(BrokenBackend), 8000));
        let llm = Arc::new(MockLlmClient::with_script(vec!["still fine".to_string()]));
        let gen = RagGenerator::new(llm, store, "persona", 1);
        assert_eq!(gen.generate("hello", "u").await.unwrap(), "still fine");
    }

    #[test]
    fn test_memory_block_markers() {
        assert!(RagGenerator::memory_block(&[]).contains("no stored memories"));
    }
}
