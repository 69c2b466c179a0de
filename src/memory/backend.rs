//! 记忆后端能力：add / search / get_all
//!
//! 后端被视作不透明外部服务，返回原始 JSON（裸数组或 `{"results": [...]}` 包装不定），
//! 由 MemoryStore 在边界处统一规范化。内置两种实现：进程内 InMemoryBackend
//! （关键词重叠检索，按用户隔离）与 mem0 风格 REST 的 HttpMemoryBackend。

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::RwLock;

/// 记忆后端 trait：每个操作都显式携带 user_id
#[async_trait]
pub trait MemoryBackend: Send + Sync {
    /// 持久化一条内容，返回后端原始响应
    async fn add(&self, content: &str, user_id: &str) -> Result<Value, String>;

    /// 按相关度检索至多 limit 条，返回后端原始响应
    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<Value, String>;

    /// 返回该用户全部记录（插入顺序）
    async fn get_all(&self, user_id: &str) -> Result<Value, String>;
}

/// 将文本切分为小写词集合，用于简单相似度（词重叠）
fn tokenize_lower(s: &str) -> HashSet<String> {
    s.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| w.len() > 1)
        .collect()
}

struct StoredEntry {
    id: String,
    content: String,
    created_at: DateTime<Utc>,
    tokens: HashSet<String>,
}

impl StoredEntry {
    fn to_json(&self, user_id: &str, score: Option<f32>) -> Value {
        let mut obj = json!({
            "id": self.id,
            "memory": self.content,
            "user_id": user_id,
            "created_at": self.created_at.to_rfc3339(),
        });
        if let Some(s) = score {
            obj["score"] = json!(s);
        }
        obj
    }
}

/// 进程内后端：user_id -> 插入顺序的条目列表；检索用查询词覆盖率打分（0..1）
///
/// 响应故意混用两种包装：search 返回 `{"results": [...]}`，get_all 返回裸数组，
/// 用于覆盖适配层的规范化路径。
#[derive(Default)]
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, Vec<StoredEntry>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryBackend for InMemoryBackend {
    async fn add(&self, content: &str, user_id: &str) -> Result<Value, String> {
        let entry = StoredEntry {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
            tokens: tokenize_lower(content),
        };
        let confirmation = json!({
            "results": [{ "id": entry.id, "memory": entry.content, "event": "ADD" }]
        });
        let mut entries = self.entries.write().await;
        entries.entry(user_id.to_string()).or_default().push(entry);
        Ok(confirmation)
    }

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<Value, String> {
        let query_tokens = tokenize_lower(query);
        let entries = self.entries.read().await;
        let user_entries = match entries.get(user_id) {
            Some(v) => v,
            None => return Ok(json!({ "results": [] })),
        };

        let mut scored: Vec<(f32, &StoredEntry)> = user_entries
            .iter()
            .map(|e| {
                let overlap = query_tokens.intersection(&e.tokens).count();
                let score = if query_tokens.is_empty() {
                    0.0
                } else {
                    overlap as f32 / query_tokens.len() as f32
                };
                (score, e)
            })
            .filter(|(s, _)| *s > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        let results: Vec<Value> = scored
            .into_iter()
            .take(limit)
            .map(|(score, e)| e.to_json(user_id, Some(score)))
            .collect();
        Ok(json!({ "results": results }))
    }

    async fn get_all(&self, user_id: &str) -> Result<Value, String> {
        let entries = self.entries.read().await;
        let results: Vec<Value> = entries
            .get(user_id)
            .map(|v| v.iter().map(|e| e.to_json(user_id, None)).collect())
            .unwrap_or_default();
        Ok(Value::Array(results))
    }
}

/// mem0 风格 REST 后端：POST /memories、POST /search、GET /memories?user_id=
pub struct HttpMemoryBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpMemoryBackend {
    /// 构造失败（TLS 初始化等）直接报错，不退回无超时的默认客户端
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, String> {
        if !resp.status().is_success() {
            return Err(format!("memory backend returned HTTP {}", resp.status()));
        }
        resp.json::<Value>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl MemoryBackend for HttpMemoryBackend {
    async fn add(&self, content: &str, user_id: &str) -> Result<Value, String> {
        let resp = self
            .client
            .post(format!("{}/memories", self.base_url))
            .json(&json!({
                "messages": [{ "role": "user", "content": content }],
                "user_id": user_id,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::read_json(resp).await
    }

    async fn search(&self, query: &str, user_id: &str, limit: usize) -> Result<Value, String> {
        let resp = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&json!({ "query": query, "user_id": user_id, "limit": limit }))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::read_json(resp).await
    }

    async fn get_all(&self, user_id: &str) -> Result<Value, String> {
        let resp = self
            .client
            .get(format!("{}/memories", self.base_url))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Self::read_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_scoped_to_user() {
        let backend = InMemoryBackend::new();
        backend.add("I enjoy hiking on weekends", "alice").await.unwrap();
        backend.add("I prefer reading indoors", "bob").await.unwrap();

        let hits = backend.search("hiking weekends", "alice", 5).await.unwrap();
        assert_eq!(hits["results"].as_array().unwrap().len(), 1);

        let misses = backend.search("hiking weekends", "bob", 5).await.unwrap();
        assert!(misses["results"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_is_bare_array_in_insertion_order() {
        let backend = InMemoryBackend::new();
        backend.add("first entry here", "u1").await.unwrap();
        backend.add("second entry here", "u1").await.unwrap();

        let all = backend.get_all("u1").await.unwrap();
        let arr = all.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["memory"], "first entry here");
        assert_eq!(arr[1]["memory"], "second entry here");
    }

    #[test]
    fn test_http_backend_builds_with_timeout() {
        let backend = HttpMemoryBackend::new("http://localhost:8000/", 5).unwrap();
        assert_eq!(backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_tokenize_lower_strips_punctuation() {
        let tokens = tokenize_lower("Hiking, weekends!");
        assert!(tokens.contains("hiking"));
        assert!(tokens.contains("weekends"));
    }
}
