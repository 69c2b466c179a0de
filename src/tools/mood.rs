//! 情绪追踪工具
//!
//! 将情绪、强度与触发因素以模板串写入长期记忆，供后续轮次检索。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::MemoryStore;
use crate::tools::{Tool, ToolContext};

/// track_mood 工具：记录一次情绪条目
pub struct TrackMoodTool {
    store: Arc<MemoryStore>,
}

impl TrackMoodTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TrackMoodTool {
    fn name(&self) -> &str {
        "track_mood"
    }

    fn description(&self) -> &str {
        "Track the user's mood and associated triggers. Args: {\"mood\": \"anxious\", \"intensity\": 7, \"triggers\": \"...\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "mood": { "type": "string" },
                "intensity": { "type": "integer", "minimum": 1, "maximum": 10 },
                "triggers": { "type": "string" }
            },
            "required": ["mood", "intensity"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let mood = args
            .get("mood")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: mood")?;
        let intensity = args
            .get("intensity")
            .and_then(|v| v.as_i64())
            .ok_or("Missing required arg: intensity")?;
        let triggers = args.get("triggers").and_then(|v| v.as_str()).unwrap_or("");

        let entry = format!(
            "MOOD TRACKING - Date: {}, Mood: {}, Intensity: {}/10, Triggers: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            mood,
            intensity,
            triggers
        );
        self.store
            .store(&entry, &ctx.user_id)
            .await
            .map(|c| format!("Stored memory: {}", c.content))
            .map_err(|e| e.to_string())
    }
}
