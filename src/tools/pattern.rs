//! 思维模式识别工具

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::MemoryStore;
use crate::tools::{Tool, ToolContext};

/// identify_thought_pattern 工具：记录一条消极思维模式 / 认知扭曲
pub struct ThoughtPatternTool {
    store: Arc<MemoryStore>,
}

impl ThoughtPatternTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ThoughtPatternTool {
    fn name(&self) -> &str {
        "identify_thought_pattern"
    }

    fn description(&self) -> &str {
        "Record a negative thought pattern or cognitive distortion. Args: {\"thought\": \"...\", \"pattern_type\": \"catastrophizing\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "thought": { "type": "string" },
                "pattern_type": { "type": "string", "description": "e.g. catastrophizing, all-or-nothing, mind-reading" }
            },
            "required": ["thought", "pattern_type"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let thought = args
            .get("thought")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: thought")?;
        let pattern_type = args
            .get("pattern_type")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: pattern_type")?;

        let entry = format!(
            "THOUGHT PATTERN - Type: {}, Thought: '{}', Date: {}",
            pattern_type,
            thought,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.store
            .store(&entry, &ctx.user_id)
            .await
            .map(|c| format!("Stored memory: {}", c.content))
            .map_err(|e| e.to_string())
    }
}
