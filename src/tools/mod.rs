//! 工具箱：注册表、执行器与记忆 / CBT 工具集

pub mod clock;
pub mod coping;
pub mod executor;
pub mod goal;
pub mod memory_ops;
pub mod mood;
pub mod pattern;
pub mod preference;
pub mod registry;
pub mod reminder;
pub mod schema;

pub use clock::CurrentTimeTool;
pub use coping::CopingStrategyTool;
pub use executor::ToolExecutor;
pub use goal::{TherapyGoalTool, TrackProgressTool};
pub use memory_ops::{ListAllMemoriesTool, SearchMemoriesTool, StoreMemoryTool};
pub use mood::TrackMoodTool;
pub use pattern::ThoughtPatternTool;
pub use preference::{GetPreferencesTool, UpdatePreferencesTool};
pub use registry::{Tool, ToolContext, ToolRegistry};
pub use reminder::SetReminderTool;
pub use schema::tool_call_schema_json;
