//! 记忆存储适配层
//!
//! 在后端之上提供统一契约：内容校验、异构响应包装的单点规范化
//! （`{"results": [...]}` / 裸数组 / null 都归一为 `Vec<MemoryRecord>`）、
//! 按分数降序稳定排序与 limit 截断。所有操作显式携带 user_id，
//! 任何查询都不会泄漏其他用户的记录。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::core::AgentError;
use crate::memory::{MemoryBackend, MemoryRecord, StoredConfirmation};

/// 记忆存储适配器：校验、规范化、排序
pub struct MemoryStore {
    backend: Arc<dyn MemoryBackend>,
    max_content_chars: usize,
}

impl MemoryStore {
    pub fn new(backend: Arc<dyn MemoryBackend>, max_content_chars: usize) -> Self {
        Self {
            backend,
            max_content_chars,
        }
    }

    /// 持久化一条内容；空内容或超长内容拒绝写入，失败带描述性原因
    pub async fn store(
        &self,
        content: &str,
        user_id: &str,
    ) -> Result<StoredConfirmation, AgentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AgentError::Store("content is empty".to_string()));
        }
        let chars = content.chars().count();
        if chars > self.max_content_chars {
            return Err(AgentError::Store(format!(
                "content too large: {} chars (max {})",
                chars, self.max_content_chars
            )));
        }

        let raw = self
            .backend
            .add(content, user_id)
            .await
            .map_err(AgentError::Store)?;

        // 后端确认里取回记录 id；确认缺失时本地生成，保证调用方总能拿到确定的确认
        let id = normalize_results(&raw, user_id)
            .into_iter()
            .next()
            .map(|r| r.id)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(StoredConfirmation {
            id,
            content: content.to_string(),
        })
    }

    /// 检索至多 limit 条（limit 至少取 1），按相关度降序；无匹配返回空序列而非错误
    pub async fn search(
        &self,
        query: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, AgentError> {
        let limit = limit.max(1);
        let raw = self
            .backend
            .search(query, user_id, limit)
            .await
            .map_err(AgentError::Retrieval)?;

        let mut records = normalize_results(&raw, user_id);
        // 稳定排序：同分保持后端顺序
        records.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        records.truncate(limit);
        Ok(records)
    }

    /// 返回该用户全部记录；无记录返回空序列
    pub async fn list_all(&self, user_id: &str) -> Result<Vec<MemoryRecord>, AgentError> {
        let raw = self
            .backend
            .get_all(user_id)
            .await
            .map_err(AgentError::Retrieval)?;
        Ok(normalize_results(&raw, user_id))
    }
}

/// 规范化边界：把后端各种响应形态统一为记录序列
///
/// 接受 `{"results": [...]}` 包装、裸数组、单条对象；null / 缺失 / 无法识别一律视为空。
fn normalize_results(raw: &Value, user_id: &str) -> Vec<MemoryRecord> {
    let items: Vec<&Value> = match raw {
        Value::Array(arr) => arr.iter().collect(),
        Value::Object(obj) => match obj.get("results") {
            Some(Value::Array(arr)) => arr.iter().collect(),
            Some(Value::Null) | None if obj.contains_key("memory") || obj.contains_key("content") => {
                vec![raw]
            }
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| record_from_item(item, user_id))
        .collect()
}

/// 单条后端条目 -> MemoryRecord；内容字段可叫 memory 或 content，缺内容则丢弃
fn record_from_item(item: &Value, user_id: &str) -> Option<MemoryRecord> {
    let content = item
        .get("memory")
        .or_else(|| item.get("content"))
        .and_then(|v| v.as_str())?
        .to_string();

    let id = item
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let created_at = item
        .get("created_at")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    let relevance_score = item
        .get("score")
        .or_else(|| item.get("relevance_score"))
        .and_then(|v| v.as_f64())
        .map(|f| f as f32);

    let metadata: HashMap<String, Value> = item
        .get("metadata")
        .and_then(|v| v.as_object())
        .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default();

    Some(MemoryRecord {
        id,
        user_id: item
            .get("user_id")
            .and_then(|v| v.as_str())
            .unwrap_or(user_id)
            .to_string(),
        content,
        metadata,
        created_at,
        relevance_score,
    })
}
