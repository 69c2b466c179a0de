//! 提醒工具

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::MemoryStore;
use crate::tools::{Tool, ToolContext};

/// set_reminder 工具：以记忆条目形式记录一条提醒
pub struct SetReminderTool {
    store: Arc<MemoryStore>,
}

impl SetReminderTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SetReminderTool {
    fn name(&self) -> &str {
        "set_reminder"
    }

    fn description(&self) -> &str {
        "Set a reminder for the user. Args: {\"reminder_text\": \"...\", \"date_time\": \"2026-09-01 10:00\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "reminder_text": { "type": "string" },
                "date_time": { "type": "string", "description": "Optional, e.g. 2026-09-01 10:00" }
            },
            "required": ["reminder_text"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let text = args
            .get("reminder_text")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: reminder_text")?;
        let date_time = args.get("date_time").and_then(|v| v.as_str());

        let entry = match date_time {
            Some(dt) => format!("Reminder: {} for {}", text, dt),
            None => format!("Reminder: {}", text),
        };
        self.store
            .store(&entry, &ctx.user_id)
            .await
            .map(|c| format!("Stored memory: {}", c.content))
            .map_err(|e| e.to_string())
    }
}
