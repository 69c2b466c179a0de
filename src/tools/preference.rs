//! 用户偏好工具：get_preferences / update_preferences

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::memory::MemoryStore;
use crate::tools::memory_ops::render_records;
use crate::tools::{Tool, ToolContext};

/// get_preferences 工具：按类别检索用户偏好
pub struct GetPreferencesTool {
    store: Arc<MemoryStore>,
    search_limit: usize,
}

impl GetPreferencesTool {
    pub fn new(store: Arc<MemoryStore>, search_limit: usize) -> Self {
        Self {
            store,
            search_limit,
        }
    }
}

#[async_trait]
impl Tool for GetPreferencesTool {
    fn name(&self) -> &str {
        "get_preferences"
    }

    fn description(&self) -> &str {
        "Get stored user preferences for a category. Args: {\"category\": \"general\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string", "description": "Preference category, defaults to general" }
            },
            "required": []
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let category = args
            .get("category")
            .and_then(|v| v.as_str())
            .unwrap_or("general");

        let records = self
            .store
            .search(
                &format!("user preferences {}", category),
                &ctx.user_id,
                self.search_limit,
            )
            .await
            .map_err(|e| e.to_string())?;

        if records.is_empty() {
            Ok(format!("No stored preferences for category: {}", category))
        } else {
            Ok(render_records("User preferences found:", &records))
        }
    }
}

/// update_preferences 工具：写入一条类别化偏好
pub struct UpdatePreferencesTool {
    store: Arc<MemoryStore>,
}

impl UpdatePreferencesTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdatePreferencesTool {
    fn name(&self) -> &str {
        "update_preferences"
    }

    fn description(&self) -> &str {
        "Store a user preference. Args: {\"category\": \"...\", \"preference\": \"...\"}"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "category": { "type": "string" },
                "preference": { "type": "string" }
            },
            "required": ["category", "preference"]
        })
    }

    async fn execute(&self, ctx: &ToolContext, args: Value) -> Result<String, String> {
        let category = args
            .get("category")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: category")?;
        let preference = args
            .get("preference")
            .and_then(|v| v.as_str())
            .ok_or("Missing required arg: preference")?;

        let entry = format!("User preference for {}: {}", category, preference);
        self.store
            .store(&entry, &ctx.user_id)
            .await
            .map(|c| format!("Stored memory: {}", c.content))
            .map_err(|e| e.to_string())
    }
}
