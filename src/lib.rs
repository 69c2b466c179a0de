//! Solace - CBT 记忆增强陪伴智能体
//!
//! 模块划分：
//! - **agent**: 无头 Agent（组件装配、单轮编排、用户切换）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、轮次状态机、通道编排器
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）
//! - **memory**: 用户隔离的记忆后端与存储适配层
//! - **rag**: 单次检索增强生成
//! - **react**: Planner 与有界工具推理循环
//! - **tools**: 工具箱（记忆操作 + CBT 工具）与执行器

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod rag;
pub mod react;
pub mod tools;
