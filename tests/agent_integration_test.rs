//! Agent 轮次集成测试
//!
//! 覆盖完整轮次流程：用户隔离、延迟写入次序、强制终止、失败恢复。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{sleep, Duration, Instant};

use solace::agent::{build_agent_components, Agent};
use solace::config::AppConfig;
use solace::core::TurnStatus;
use solace::llm::{LlmClient, Message, MockLlmClient};
use solace::memory::{InMemoryBackend, MemoryBackend};

fn agent_with(cfg: &AppConfig, llm: Arc<dyn LlmClient>, backend: Arc<dyn MemoryBackend>) -> Agent {
    Agent::new(build_agent_components(cfg, llm, backend), "guest")
}

/// 等到延迟写入落库（后台任务完成），超时视为测试失败
async fn wait_for_memories(agent: &Agent, min_count: usize) {
    for _ in 0..50 {
        if agent.list_memories().await.len() >= min_count {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("deferred memory write did not land within 1s");
}

#[tokio::test]
async fn test_memories_are_isolated_per_user() {
    let cfg = AppConfig::default();
    let llm = Arc::new(MockLlmClient::new());
    let mut agent = agent_with(&cfg, llm, Arc::new(InMemoryBackend::new()));

    agent.switch_user("alice");
    let turn = agent.submit("I enjoy hiking").await;
    assert_eq!(turn.status, TurnStatus::Committed);
    wait_for_memories(&agent, 1).await;
    assert!(agent
        .list_memories()
        .await
        .iter()
        .any(|r| r.content.contains("hiking")));

    agent.switch_user("bob");
    assert!(agent.list_memories().await.is_empty());
}

/// 记录 complete 返回时刻与调用次数的 LLM
struct TimedLlm {
    calls: AtomicUsize,
    last_return: Mutex<Option<Instant>>,
    output: String,
}

impl TimedLlm {
    fn new(output: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last_return: Mutex::new(None),
            output: output.to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for TimedLlm {
    async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_return.lock().unwrap() = Some(Instant::now());
        Ok(self.output.clone())
    }
}

/// 记录 add 被调用时刻的后端包装
struct TimedBackend {
    inner: InMemoryBackend,
    add_at: Mutex<Option<Instant>>,
}

impl TimedBackend {
    fn new() -> Self {
        Self {
            inner: InMemoryBackend::new(),
            add_at: Mutex::new(None),
        }
    }
}

#[async_trait]
impl MemoryBackend for TimedBackend {
    async fn add(&self, content: &str, user_id: &str) -> Result<Value, String> {
        *self.add_at.lock().unwrap() = Some(Instant::now());
        self.inner.add(content, user_id).await
    }

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<Value, String> {
        self.inner.search(query, user_id, limit).await
    }

    async fn get_all(&self, user_id: &str) -> Result<Value, String> {
        self.inner.get_all(user_id).await
    }
}

#[tokio::test]
async fn test_memory_write_happens_after_generation() {
    let cfg = AppConfig::default();
    let llm = Arc::new(TimedLlm::new("A supportive reply."));
    let backend = Arc::new(TimedBackend::new());
    let mut agent = agent_with(&cfg, llm.clone(), backend.clone());

    let turn = agent.submit("I had a rough day").await;
    assert_eq!(turn.status, TurnStatus::Committed);
    wait_for_memories(&agent, 1).await;

    let llm_returned = llm.last_return.lock().unwrap().expect("llm was called");
    let added = backend.add_at.lock().unwrap().expect("add was called");
    assert!(added >= llm_returned, "memory write must not precede the reply");
}

#[tokio::test]
async fn test_runaway_loop_is_forced_to_terminate() {
    let mut cfg = AppConfig::default();
    cfg.agent.max_iterations = 2;

    // 模型每轮都要求调工具，永远不给最终回答
    let llm = Arc::new(TimedLlm::new(r#"{"tool": "current_time", "args": {}}"#));
    let mut agent = agent_with(&cfg, llm.clone(), Arc::new(InMemoryBackend::new()));

    let turn = agent.submit("hello").await;
    assert_eq!(turn.status, TurnStatus::Failed);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    let reply = turn.bot_text.unwrap();
    assert!(reply.starts_with("Sorry, I encountered an error"));
    assert!(reply.contains("Iteration limit exceeded"));
}

/// 总是失败的 LLM
struct BrokenLlm;

#[async_trait]
impl LlmClient for BrokenLlm {
    async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
        Err("model unavailable".to_string())
    }
}

#[tokio::test]
async fn test_generation_failure_does_not_end_session() {
    let cfg = AppConfig::default();
    let mut agent = agent_with(&cfg, Arc::new(BrokenLlm), Arc::new(InMemoryBackend::new()));

    let failed = agent.submit("hello").await;
    assert_eq!(failed.status, TurnStatus::Failed);
    assert!(failed
        .bot_text
        .as_deref()
        .unwrap()
        .starts_with("Sorry, I encountered an error"));
    // 失败轮次不写记忆
    sleep(Duration::from_millis(100)).await;
    assert!(agent.list_memories().await.is_empty());

    // 同一会话继续接收后续轮次，每轮都到终态
    let next = agent.submit("still here").await;
    assert!(next.is_terminal());
    assert_eq!(agent.transcript().len(), 2);
    assert!(agent.transcript().iter().all(|t| t.is_terminal()));
}

#[tokio::test]
async fn test_tool_failure_becomes_observation_and_recovers() {
    let cfg = AppConfig::default();
    // 第一轮调不存在的工具，第二轮给最终回答
    let llm = Arc::new(MockLlmClient::with_script(vec![
        r#"{"tool": "no_such_tool", "args": {}}"#.to_string(),
        "Let's take a breath and start over.".to_string(),
    ]));
    let mut agent = agent_with(&cfg, llm, Arc::new(InMemoryBackend::new()));

    let turn = agent.submit("hi").await;
    assert_eq!(turn.status, TurnStatus::Committed);
    assert_eq!(
        turn.bot_text.as_deref(),
        Some("Let's take a breath and start over.")
    );
}

#[test]
fn test_tool_catalog_advertises_required_parameters() {
    let cfg = AppConfig::default();
    let llm = Arc::new(MockLlmClient::new());
    let components = build_agent_components(&cfg, llm, Arc::new(InMemoryBackend::new()));

    let schema: Value = serde_json::from_str(&components.executor.tools_schema_json()).unwrap();
    let tools = schema.as_array().unwrap();

    // 有必填参数的工具必须在 schema 里声明，否则模型会按无参调用
    let expected = [
        ("store_memory", vec!["content"]),
        ("search_memories", vec!["query"]),
        ("track_mood", vec!["mood", "intensity"]),
        ("identify_thought_pattern", vec!["thought", "pattern_type"]),
        ("suggest_coping_strategy", vec!["situation"]),
        ("set_therapy_goal", vec!["goal"]),
        ("track_progress", vec!["goal_area", "notes"]),
        ("update_preferences", vec!["category", "preference"]),
        ("set_reminder", vec!["reminder_text"]),
    ];
    for (name, required) in expected {
        let tool = tools
            .iter()
            .find(|t| t["name"] == name)
            .unwrap_or_else(|| panic!("tool {} missing from catalog", name));
        let declared = tool["parameters"]["required"].as_array().unwrap();
        for arg in required {
            assert!(
                declared.iter().any(|v| v == arg),
                "{} must declare required arg {}",
                name,
                arg
            );
        }
    }
}

#[tokio::test]
async fn test_every_submitted_turn_reaches_a_terminal_state() {
    let cfg = AppConfig::default();
    let llm = Arc::new(MockLlmClient::new());
    let mut agent = agent_with(&cfg, llm, Arc::new(InMemoryBackend::new()));

    for input in ["one", "two", "three"] {
        agent.submit(input).await;
    }
    assert_eq!(agent.transcript().len(), 3);
    assert!(agent.transcript().iter().all(|t| t.is_terminal()));
}
