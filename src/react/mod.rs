//! 推理层：Planner 与有界工具推理循环

pub mod loop_;
pub mod planner;

pub use loop_::{reasoning_loop, ReactResult};
pub use planner::{parse_llm_output, Planner, PlannerOutput, ToolCall};
