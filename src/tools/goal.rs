//! 治疗目标与进展工具

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::MemoryStore;
use crate::tools::{Tool, ToolContext};

/// set_therapy_goal 工具：设定并持久化一个治疗目标
pub struct TherapyGoalTool {
    store: Arc<MemoryStore>,
}

impl TherapyGoalTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TherapyGoalTool {
    fn name(&self) -> &str {
        "set_therapy_goal"
    }

    fn description(&self) -> &str {
        "Set and store a therapy goal. Args: {\"goal\": \"...\", \"timeframe\": \"2 weeks\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "goal": { "type": "string" },
                "timeframe": { "type": "string" }
            },
            "required": ["goal"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let goal = args
            .get("goal")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: goal")?;
        let timeframe = args.get("timeframe").and_then(|v| v.as_str()).unwrap_or("");

        let entry = format!(
            "THERAPY GOAL - Goal: {}, Timeframe: {}, Set on: {}",
            goal,
            timeframe,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.store
            .store(&entry, &ctx.user_id)
            .await
            .map(|c| format!("Stored memory: {}", c.content))
            .map_err(|e| e.to_string())
    }
}

/// track_progress 工具：记录某个目标领域的进展
pub struct TrackProgressTool {
    store: Arc<MemoryStore>,
}

impl TrackProgressTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TrackProgressTool {
    fn name(&self) -> &str {
        "track_progress"
    }

    fn description(&self) -> &str {
        "Track progress toward a therapy goal. Args: {\"goal_area\": \"...\", \"notes\": \"...\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "goal_area": { "type": "string" },
                "notes": { "type": "string" }
            },
            "required": ["goal_area", "notes"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let goal_area = args
            .get("goal_area")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: goal_area")?;
        let notes = args
            .get("notes")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: notes")?;

        let entry = format!(
            "PROGRESS UPDATE - Area: {}, Notes: {}, Date: {}",
            goal_area,
            notes,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.store
            .store(&entry, &ctx.user_id)
            .await
            .map(|c| format!("Stored memory: {}", c.content))
            .map_err(|e| e.to_string())
    }
}
