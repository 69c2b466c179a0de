//! 记忆记录：规范化后的统一结果类型

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单条用户隔离的记忆记录；创建后不可变，跨用户不可见
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub user_id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    /// 相关度分数，仅检索结果携带
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f32>,
}

/// 写入成功确认；调用方据此可确定性区分「已写入」与「写入失败」
#[derive(Debug, Clone)]
pub struct StoredConfirmation {
    pub id: String,
    pub content: String,
}
