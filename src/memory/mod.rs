//! 记忆层：用户隔离的长期记忆（后端能力 + 适配层 + 统一记录类型）

pub mod backend;
pub mod record;
pub mod store;

pub use backend::{HttpMemoryBackend, InMemoryBackend, MemoryBackend};
pub use record::{MemoryRecord, StoredConfirmation};
pub use store::MemoryStore;
