//! 时间查询工具

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolContext};

/// current_time 工具：返回当前日期与时间
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Get the current date and time. No args."
    }

    async fn execute(&self, _ctx: &ToolContext, _args: Value) -> Result<String, String> {
        Ok(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string())
    }
}
