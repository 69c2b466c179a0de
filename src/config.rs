//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `SOLACE__*` 覆盖（双下划线表示嵌套，
//! 如 `SOLACE__LLM__MODEL=gpt-4o-mini`）。所有字段均有默认值，缺少配置文件时仍可运行。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub memory: MemorySection,
    #[serde(default)]
    pub agent: AgentSection,
}

/// [app] 段：应用名与默认用户身份
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 会话启动时的用户身份，可在会话内切换
    #[serde(default = "default_user")]
    pub default_user: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            default_user: default_user(),
        }
    }
}

fn default_user() -> String {
    "guest".to_string()
}

/// [llm] 段：后端选择与模型
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai（兼容端点）/ mock；无 API Key 时自动退回 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [memory] 段：记忆后端与检索参数
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySection {
    /// 后端：in-memory / http（mem0 风格 REST，需配 base_url）
    #[serde(default = "default_memory_backend")]
    pub backend: String,
    pub base_url: Option<String>,
    /// 单次生成前注入上下文的检索条数（上下文注入用，保持个位数）
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// 工具内 search_memories 的默认条数
    #[serde(default = "default_tool_search_limit")]
    pub tool_search_limit: usize,
    /// 单条记忆内容最大字符数，超出拒绝写入
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// HTTP 后端单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            base_url: None,
            search_limit: default_search_limit(),
            tool_search_limit: default_tool_search_limit(),
            max_content_chars: default_max_content_chars(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_memory_backend() -> String {
    "in-memory".to_string()
}

fn default_search_limit() -> usize {
    1
}

fn default_tool_search_limit() -> usize {
    5
}

fn default_max_content_chars() -> usize {
    8000
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// [agent] 段：回复模式与推理循环参数
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// 模式：react（有界工具推理循环）/ predict（单次检索增强生成）
    #[serde(default = "default_mode")]
    pub mode: String,
    /// 推理循环最大轮数，防止失控循环
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout_secs(),
        }
    }
}

fn default_mode() -> String {
    "react".to_string()
}

fn default_max_iterations() -> usize {
    6
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            memory: MemorySection::default(),
            agent: AgentSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 SOLACE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 SOLACE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("SOLACE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.default_user, "guest");
        assert_eq!(cfg.memory.search_limit, 1);
        assert_eq!(cfg.agent.mode, "react");
        assert_eq!(cfg.agent.max_iterations, 6);
    }
}
