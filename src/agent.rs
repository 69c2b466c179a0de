//! Solace Agent：单轮编排
//!
//! 从配置装配 LLM / 记忆存储 / 工具箱 / Planner / RAG 生成器，
//! 并驱动单轮流程：记录 Pending 轮次 -> 生成（react 或 predict 模式）->
//! 提交 Committed / Failed 终态 -> 回复展示后延迟写入记忆。
//! 不碰 UI，通道编排见 core::orchestrator。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::{Turn, TurnStatus};
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};
use crate::memory::{HttpMemoryBackend, InMemoryBackend, MemoryBackend, MemoryRecord, MemoryStore};
use crate::rag::RagGenerator;
use crate::react::{reasoning_loop, Planner};
use crate::tools::{
    CopingStrategyTool, CurrentTimeTool, GetPreferencesTool, ListAllMemoriesTool,
    SearchMemoriesTool, SetReminderTool, StoreMemoryTool, TherapyGoalTool, ThoughtPatternTool,
    ToolContext, ToolExecutor, ToolRegistry, TrackMoodTool, TrackProgressTool,
    UpdatePreferencesTool,
};

/// 内置人设：config/prompts/system.txt 缺失时的回退
pub const DEFAULT_PERSONA: &str = "You are Solace, a supportive companion grounded in \
cognitive behavioral therapy. Validate the user's emotions before anything else. Use gentle \
Socratic questions to help them examine their thoughts; never lecture. You are not a medical \
professional: never diagnose, and if the user mentions self-harm or an emergency, advise \
contacting local emergency services (e.g. 112) or a crisis hotline immediately. Keep replies \
concise and warm. Reference stored memories only when they are relevant to what the user \
just said.";

/// 回复模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    /// 有界工具推理循环
    React,
    /// 单次检索增强生成，不用工具
    Predict,
}

impl AgentMode {
    fn from_config(mode: &str) -> Self {
        match mode.to_lowercase().as_str() {
            "predict" => AgentMode::Predict,
            _ => AgentMode::React,
        }
    }
}

/// 人设：优先读 config/prompts/system.txt，缺失时用内置回退
pub fn load_persona() -> String {
    ["config/prompts/system.txt", "../config/prompts/system.txt"]
        .into_iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_PERSONA.to_string())
}

/// 根据配置与环境变量选择 LLM 后端（OpenAI 兼容 / Mock）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    if provider == "openai" && std::env::var("OPENAI_API_KEY").is_ok() {
        tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
        Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            None,
        ))
    } else {
        tracing::warn!("No API key set or provider unknown, using Mock LLM");
        Arc::new(MockLlmClient::new())
    }
}

/// 根据配置选择记忆后端（http 需配 base_url，否则进程内后端）
pub fn create_backend_from_config(cfg: &AppConfig) -> Arc<dyn MemoryBackend> {
    match (cfg.memory.backend.to_lowercase().as_str(), &cfg.memory.base_url) {
        ("http", Some(url)) => match HttpMemoryBackend::new(url, cfg.memory.request_timeout_secs) {
            Ok(backend) => {
                tracing::info!("Using HTTP memory backend at {}", url);
                Arc::new(backend)
            }
            Err(e) => {
                tracing::error!("HTTP memory backend init failed ({}), using in-memory backend", e);
                Arc::new(InMemoryBackend::new())
            }
        },
        ("http", None) => {
            tracing::warn!("memory.backend = http but no base_url set, using in-memory backend");
            Arc::new(InMemoryBackend::new())
        }
        _ => Arc::new(InMemoryBackend::new()),
    }
}

/// 装配好的 Agent 组件（测试可注入 LLM 与后端）
pub struct AgentComponents {
    pub store: Arc<MemoryStore>,
    pub executor: ToolExecutor,
    pub planner: Planner,
    pub generator: RagGenerator,
    pub mode: AgentMode,
    pub max_iterations: usize,
}

/// 用指定的 LLM 与记忆后端装配组件
pub fn build_agent_components(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    backend: Arc<dyn MemoryBackend>,
) -> AgentComponents {
    let store = Arc::new(MemoryStore::new(backend, cfg.memory.max_content_chars));
    let persona = load_persona();

    let mut registry = ToolRegistry::new();
    registry.register(StoreMemoryTool::new(store.clone()));
    registry.register(SearchMemoriesTool::new(store.clone(), cfg.memory.tool_search_limit));
    registry.register(ListAllMemoriesTool::new(store.clone()));
    registry.register(TrackMoodTool::new(store.clone()));
    registry.register(ThoughtPatternTool::new(store.clone()));
    registry.register(CopingStrategyTool::new(store.clone(), cfg.memory.tool_search_limit));
    registry.register(TherapyGoalTool::new(store.clone()));
    registry.register(TrackProgressTool::new(store.clone()));
    registry.register(GetPreferencesTool::new(store.clone(), cfg.memory.tool_search_limit));
    registry.register(UpdatePreferencesTool::new(store.clone()));
    registry.register(SetReminderTool::new(store.clone()));
    registry.register(CurrentTimeTool);

    let executor = ToolExecutor::new(registry, cfg.agent.tool_timeout_secs);
    let planner = Planner::new(llm.clone(), persona.clone());
    let generator = RagGenerator::new(llm, store.clone(), persona, cfg.memory.search_limit);

    AgentComponents {
        store,
        executor,
        planner,
        generator,
        mode: AgentMode::from_config(&cfg.agent.mode),
        max_iterations: cfg.agent.max_iterations,
    }
}

/// 从配置装配组件（生产路径）
pub fn create_agent_components(cfg: &AppConfig) -> AgentComponents {
    let llm = create_llm_from_config(cfg);
    let backend = create_backend_from_config(cfg);
    build_agent_components(cfg, llm, backend)
}

/// 会话级 Agent：持有组件、对话记录与当前用户身份
pub struct Agent {
    components: AgentComponents,
    transcript: Vec<Turn>,
    active_user: String,
}

impl Agent {
    pub fn new(components: AgentComponents, default_user: impl Into<String>) -> Self {
        Self {
            components,
            transcript: Vec::new(),
            active_user: default_user.into(),
        }
    }

    pub fn active_user(&self) -> &str {
        &self.active_user
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
    }

    /// 切换用户身份；切到不同用户时清空对话记录，避免上一个用户的回复串台
    pub fn switch_user(&mut self, user_id: &str) {
        if user_id != self.active_user {
            self.active_user = user_id.to_string();
            self.transcript.clear();
        }
    }

    /// 当前用户的全部记忆（/memories 视图用）
    pub async fn list_memories(&self) -> Vec<MemoryRecord> {
        match self.components.store.list_all(&self.active_user).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("list memories failed: {}", e);
                Vec::new()
            }
        }
    }

    /// 处理一轮用户输入，返回终态轮次的克隆
    ///
    /// 轮次总会到达终态：成功则 Committed 并延迟写入原始输入到记忆，
    /// 失败则 Failed 并以道歉消息作为回复；失败不影响后续轮次。
    pub async fn submit(&mut self, user_input: &str) -> Turn {
        let idx = self.transcript.len();
        self.transcript.push(Turn::new(user_input));
        self.transcript[idx].status = TurnStatus::Generating;

        let ctx = ToolContext::new(self.active_user.clone());
        let result = match self.components.mode {
            AgentMode::React => reasoning_loop(
                &self.components.planner,
                &self.components.executor,
                &ctx,
                user_input,
                self.components.max_iterations,
            )
            .await
            .map(|r| r.response),
            AgentMode::Predict => {
                self.components
                    .generator
                    .generate(user_input, &self.active_user)
                    .await
            }
        };

        let (prompt_tokens, completion_tokens, total_tokens) =
            self.components.planner.token_usage();
        if total_tokens > 0 {
            tracing::debug!(prompt_tokens, completion_tokens, total_tokens, "token usage");
        }

        match result {
            Ok(response) => {
                self.transcript[idx].status = TurnStatus::Committed;
                self.transcript[idx].bot_text = Some(response);

                // 回复已展示，原始输入在后台写入记忆；失败只记日志，不影响本轮结果
                let store = self.components.store.clone();
                let content = user_input.to_string();
                let user_id = self.active_user.clone();
                tokio::spawn(async move {
                    if let Err(e) = store.store(&content, &user_id).await {
                        tracing::warn!(user_id = %user_id, "deferred memory store failed: {}", e);
                    }
                });
            }
            Err(e) => {
                tracing::error!("turn failed: {}", e);
                self.transcript[idx].status = TurnStatus::Failed;
                self.transcript[idx].bot_text =
                    Some(format!("Sorry, I encountered an error: {}", e));
            }
        }

        self.transcript[idx].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_with_script(outputs: Vec<String>) -> Agent {
        let cfg = AppConfig::default();
        let llm = Arc::new(MockLlmClient::with_script(outputs));
        let backend = Arc::new(InMemoryBackend::new());
        Agent::new(build_agent_components(&cfg, llm, backend), "guest")
    }

    #[tokio::test]
    async fn test_submit_reaches_committed() {
        let mut agent = agent_with_script(vec!["You are not alone in this.".to_string()]);
        let turn = agent.submit("I feel anxious today").await;
        assert_eq!(turn.status, TurnStatus::Committed);
        assert_eq!(turn.bot_text.as_deref(), Some("You are not alone in this."));
        assert!(turn.is_terminal());
    }

    #[tokio::test]
    async fn test_switch_user_clears_transcript() {
        let mut agent = agent_with_script(vec!["ok".to_string()]);
        agent.submit("hello").await;
        assert_eq!(agent.transcript().len(), 1);

        agent.switch_user("alice");
        assert_eq!(agent.active_user(), "alice");
        assert!(agent.transcript().is_empty());

        // 切回同名用户不清空
        agent.switch_user("alice");
        assert!(agent.transcript().is_empty());
    }

    #[tokio::test]
    async fn test_mode_parsing() {
        assert_eq!(AgentMode::from_config("predict"), AgentMode::Predict);
        assert_eq!(AgentMode::from_config("react"), AgentMode::React);
        assert_eq!(AgentMode::from_config("anything-else"), AgentMode::React);
    }
}
