//! Agent 错误类型
//!
//! 按传播策略分类：Store 用于延迟写入失败（仅记日志，不回滚已展示的回复）；
//! Retrieval 在生成前检索失败时降级为「无记忆」；ToolExecutionFailed / ToolTimeout
//! 在推理循环内折叠为 Observation；Generation 与 IterationLimitExceeded
//! 是唯二到达调用方的失败，对应 Failed 轮次。

use thiserror::Error;

/// Agent 运行过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 记忆写入失败（后端不可达或内容被拒绝）
    #[error("Memory store failed: {0}")]
    Store(String),

    /// 记忆检索失败
    #[error("Memory retrieval failed: {0}")]
    Retrieval(String),

    /// LLM 调用失败
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    /// 推理循环在 max_iterations 轮内未产出最终回答；携带最后一次模型输出
    #[error("Iteration limit exceeded: {0}")]
    IterationLimitExceeded(String),

    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}
