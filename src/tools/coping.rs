//! 应对策略工具
//!
//! 先检索既往对同类情境奏效的策略，再记录本次讨论，观察值同时带回两者。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::MemoryStore;
use crate::tools::memory_ops::render_records;
use crate::tools::{Tool, ToolContext};

/// suggest_coping_strategy 工具
pub struct CopingStrategyTool {
    store: Arc<MemoryStore>,
    search_limit: usize,
}

impl CopingStrategyTool {
    pub fn new(store: Arc<MemoryStore>, search_limit: usize) -> Self {
        Self {
            store,
            search_limit,
        }
    }
}

#[async_trait]
impl Tool for CopingStrategyTool {
    fn name(&self) -> &str {
        "suggest_coping_strategy"
    }

    fn description(&self) -> &str {
        "Recall past coping strategies for a situation and record the current discussion. Args: {\"situation\": \"...\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "situation": { "type": "string", "description": "The situation the user needs to cope with" }
            },
            "required": ["situation"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let situation = args
            .get("situation")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: situation")?;

        let previous = self
            .store
            .search(
                &format!("coping strategy {}", situation),
                &ctx.user_id,
                self.search_limit,
            )
            .await
            .map(|records| {
                if records.is_empty() {
                    "No previous coping strategies found.".to_string()
                } else {
                    render_records("Previous coping strategies:", &records)
                }
            })
            .unwrap_or_else(|e| format!("Error searching memories: {}", e));

        let entry = format!(
            "COPING STRATEGY - Situation: {}, Date: {}",
            situation,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.store
            .store(&entry, &ctx.user_id)
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!(
            "Recorded coping strategy discussion for: {}. {}",
            situation, previous
        ))
    }
}
