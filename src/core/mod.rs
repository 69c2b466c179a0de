//! 核心层：错误类型、轮次状态机与通道编排器

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::AgentError;
pub use orchestrator::{create_agent, Command};
pub use state::{AgentPhase, Turn, TurnStatus, UiState};
