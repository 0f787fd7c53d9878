// 存储模块 - 图鉴集合的持久化

// 子模块
pub mod config;
pub mod entry_store;
pub mod kv;

// 重新导出主要类型
pub use config::StorageConfig;
pub use entry_store::{prepend, EntryStore};
pub use kv::{FileKvStore, KeyValueStore, MemoryKvStore};

/// 当前时间（毫秒时间戳）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
