// 图鉴领域管理器
//
// 把集合存储和选中状态组合在一起，供提交流水线和界面注入使用

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::selection::SelectionState;
use super::stats::CollectionStats;
use crate::event_bus::{AppEvent, EventBus};
use crate::models::{Collection, Entry};
use crate::storage::EntryStore;

/// 图鉴领域管理器 - 负责集合与详情选中
pub struct CollectionDomain {
    store: Arc<EntryStore>,
    selection: RwLock<SelectionState>,
    event_bus: Arc<EventBus>,
    grid_min_slots: usize,
}

impl CollectionDomain {
    pub fn new(store: Arc<EntryStore>, event_bus: Arc<EventBus>, grid_min_slots: usize) -> Self {
        Self {
            store,
            selection: RwLock::new(SelectionState::new()),
            event_bus,
            grid_min_slots,
        }
    }

    /// 获取集合存储
    pub fn get_store(&self) -> &Arc<EntryStore> {
        &self.store
    }

    /// 当前集合（最新的在前）
    pub async fn entries(&self) -> Collection {
        self.store.entries().await
    }

    /// 网格统计
    pub async fn stats(&self) -> CollectionStats {
        let entries = self.store.entries().await;
        CollectionStats::compute(&entries, self.grid_min_slots)
    }

    /// 写入新条目
    pub async fn add_entry(&self, entry: Entry) -> Result<Collection> {
        let collection = self.store.add(entry.clone()).await?;
        self.event_bus.publish(AppEvent::EntryAdded {
            entry_id: entry.id,
            total: collection.len(),
        });
        Ok(collection)
    }

    /// 直接打开条目详情（用于刚创建的条目）
    pub async fn show_entry(&self, entry: Entry) {
        let entry_id = entry.id.clone();
        self.selection.write().await.select(entry);
        self.publish_selection(Some(entry_id));
    }

    /// 点击卡片：按ID打开详情
    pub async fn open_entry(&self, id: &str) -> Result<Entry> {
        let entries = self.store.entries().await;
        let entry = self
            .selection
            .write()
            .await
            .select_by_id(&entries, id)?
            .clone();
        self.publish_selection(Some(entry.id.clone()));
        Ok(entry)
    }

    /// 关闭详情
    pub async fn close_entry(&self) {
        self.selection.write().await.clear();
        self.publish_selection(None);
    }

    /// 当前打开的条目
    pub async fn selected(&self) -> Option<Entry> {
        self.selection.read().await.current().cloned()
    }

    /// 从后端重新加载集合，并清除已不存在的选中
    pub async fn reload(&self) -> Collection {
        let entries = self.store.reload().await;
        if self.selection.write().await.reconcile(&entries) {
            self.publish_selection(None);
        }
        entries
    }

    fn publish_selection(&self, entry_id: Option<String>) {
        self.event_bus
            .publish(AppEvent::SelectionChanged { entry_id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rarity, SnowmanStats};
    use crate::storage::{KeyValueStore, MemoryKvStore, StorageConfig};

    fn entry(id: &str, kind: &str) -> Entry {
        Entry {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            kind: kind.to_string(),
            rarity: Rarity::Common,
            stats: SnowmanStats {
                creativity: 5,
                roundness: 5,
                accessories: 5,
                chill_factor: 5,
                durability: 5,
            },
            fun_fact: String::new(),
            image_url: "data:image/png;base64,AAAA".to_string(),
            sticker_url: None,
            timestamp: 0,
        }
    }

    fn domain(backend: Arc<MemoryKvStore>) -> CollectionDomain {
        let store = Arc::new(EntryStore::new(backend, StorageConfig::default()));
        CollectionDomain::new(store, Arc::new(EventBus::new(16)), 12)
    }

    #[tokio::test]
    async fn test_open_and_close_entry() {
        let domain = domain(Arc::new(MemoryKvStore::new()));
        domain.add_entry(entry("1", "클래식")).await.unwrap();

        let opened = domain.open_entry("1").await.unwrap();
        assert_eq!(opened.id, "1");
        assert_eq!(domain.selected().await.map(|e| e.id), Some("1".to_string()));

        assert!(domain.open_entry("nope").await.is_err());

        domain.close_entry().await;
        assert!(domain.selected().await.is_none());
    }

    #[tokio::test]
    async fn test_stats_follow_collection() {
        let domain = domain(Arc::new(MemoryKvStore::new()));
        domain.add_entry(entry("1", "클래식")).await.unwrap();
        domain.add_entry(entry("2", "진흙")).await.unwrap();
        domain.add_entry(entry("3", "진흙")).await.unwrap();

        let stats = domain.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.empty_slots, 9);
    }

    #[tokio::test]
    async fn test_reload_reconciles_selection() {
        let backend = Arc::new(MemoryKvStore::new());
        let domain = domain(backend.clone());
        domain.add_entry(entry("1", "클래식")).await.unwrap();
        domain.open_entry("1").await.unwrap();

        // 外部清空了持久化文档
        backend.set("snowmanDex", "[]").await.unwrap();
        assert!(domain.reload().await.is_empty());
        assert!(domain.selected().await.is_none());
    }
}
