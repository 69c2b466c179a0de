//! 记忆操作工具：store_memory / search_memories / list_all_memories
//!
//! 推理循环里暴露给模型的记忆三件套，均为 MemoryStore 的薄封装；
//! user_id 来自 ToolContext，模型不可指定他人身份。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::{MemoryRecord, MemoryStore};
use crate::tools::{Tool, ToolContext};

/// 将记录渲染为编号列表（工具观察值用）
pub(crate) fn render_records(header: &str, records: &[MemoryRecord]) -> String {
    let mut text = format!("{}\n", header);
    for (i, r) in records.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, r.content));
    }
    text
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("Missing required arg: {key}"))
}

/// store_memory：持久化一条用户相关信息
pub struct StoreMemoryTool {
    store: Arc<MemoryStore>,
}

impl StoreMemoryTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for StoreMemoryTool {
    fn name(&self) -> &str {
        "store_memory"
    }

    fn description(&self) -> &str {
        "Store important information about the user in long-term memory. Args: {\"content\": \"...\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "content": { "type": "string", "description": "The fact or statement to remember" }
            },
            "required": ["content"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let content = required_str(&args, "content")?;
        self.store
            .store(content, &ctx.user_id)
            .await
            .map(|c| format!("Stored memory: {}", c.content))
            .map_err(|e| e.to_string())
    }
}

/// search_memories：按相关度检索记忆
pub struct SearchMemoriesTool {
    store: Arc<MemoryStore>,
    default_limit: usize,
}

impl SearchMemoriesTool {
    pub fn new(store: Arc<MemoryStore>, default_limit: usize) -> Self {
        Self {
            store,
            default_limit,
        }
    }
}

#[async_trait]
impl Tool for SearchMemoriesTool {
    fn name(&self) -> &str {
        "search_memories"
    }

    fn description(&self) -> &str {
        "Search the user's memories by relevance. Args: {\"query\": \"...\", \"limit\": 5}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "limit": { "type": "integer", "minimum": 1 }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let query = required_str(&args, "query")?;
        let limit = args
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(self.default_limit);

        let records = self
            .store
            .search(query, &ctx.user_id, limit)
            .await
            .map_err(|e| e.to_string())?;

        if records.is_empty() {
            Ok("No relevant memories found.".to_string())
        } else {
            Ok(render_records("Relevant memories found:", &records))
        }
    }
}

/// list_all_memories：列出该用户全部记忆
pub struct ListAllMemoriesTool {
    store: Arc<MemoryStore>,
}

impl ListAllMemoriesTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListAllMemoriesTool {
    fn name(&self) -> &str {
        "list_all_memories"
    }

    fn description(&self) -> &str {
        "List all stored memories for the current user. No args."
    }

    async fn execute(&self, ctx: &ToolContext, _args: Value) -> Result<String, String> {
        let records = self
            .store
            .list_all(&ctx.user_id)
            .await
            .map_err(|e| e.to_string())?;

        if records.is_empty() {
            Ok("No memories found for this user.".to_string())
        } else {
            Ok(render_records("All memories for user:", &records))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(Arc::new(InMemoryBackend::new()), 8000))
    }

    #[tokio::test]
    async fn test_store_then_search_via_tools() {
        let store = store();
        let ctx = ToolContext::new("alice");

        let out = StoreMemoryTool::new(store.clone())
            .execute(&ctx, json!({ "content": "enjoys hiking" }))
            .await
            .unwrap();
        assert!(out.contains("Stored memory"));

        let out = SearchMemoriesTool::new(store.clone(), 5)
            .execute(&ctx, json!({ "query": "hiking" }))
            .await
            .unwrap();
        assert!(out.contains("enjoys hiking"));

        // 其他用户检索不到
        let other = ToolContext::new("bob");
        let out = SearchMemoriesTool::new(store, 5)
            .execute(&other, json!({ "query": "hiking" }))
            .await
            .unwrap();
        assert_eq!(out, "No relevant memories found.");
    }

    #[tokio::test]
    async fn test_missing_arg_is_error_string() {
        let err = StoreMemoryTool::new(store())
            .execute(&ToolContext::new("u"), json!({}))
            .await
            .unwrap_err();
        assert!(err.contains("content"));
    }
}
