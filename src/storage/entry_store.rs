// 图鉴集合存储 - 加载、保存、头部插入
//
// 集合整体序列化为一个 JSON 数组保存在固定键下，不做增量写入
// 所有写入经由 add() 串行化，保证总是在最新快照上插入
// 读取失败（文档存在但没能读出）时拒绝写入，直到下一次 reload 成功

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::config::StorageConfig;
use super::kv::KeyValueStore;
use crate::event_bus::{AppEvent, EventBus};
use crate::models::{Collection, Entry};

/// 返回新集合：entry 在首位，其后保持原有顺序
pub fn prepend(collection: &[Entry], entry: Entry) -> Collection {
    let mut next = Vec::with_capacity(collection.len() + 1);
    next.push(entry);
    next.extend_from_slice(collection);
    next
}

/// 图鉴集合存储
pub struct EntryStore {
    backend: Arc<dyn KeyValueStore>,
    config: StorageConfig,
    /// 内存快照（界面渲染与持久化的唯一数据源）
    entries: RwLock<Collection>,
    /// 上次加载时未能读出已有文档的原因，存在时拒绝写入
    read_failure: RwLock<Option<String>>,
    event_bus: Option<Arc<EventBus>>,
}

impl EntryStore {
    /// 创建空快照的存储，不读取后端
    pub fn new(backend: Arc<dyn KeyValueStore>, config: StorageConfig) -> Self {
        Self {
            backend,
            config,
            entries: RwLock::new(Vec::new()),
            read_failure: RwLock::new(None),
            event_bus: None,
        }
    }

    /// 设置事件总线（用于通知文档损坏恢复）
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// 打开存储并恢复之前保存的集合
    pub async fn open(
        backend: Arc<dyn KeyValueStore>,
        config: StorageConfig,
        event_bus: Option<Arc<EventBus>>,
    ) -> Self {
        let mut store = Self::new(backend, config);
        store.event_bus = event_bus;
        store.reload().await;
        store
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// 读取持久化的集合
    ///
    /// 不存在或格式错误时返回空集合，错误只记录日志不向上传播。
    /// 后端读取失败时同样返回空集合，但存储进入只读状态，避免覆盖没读出来的文档
    pub async fn load(&self) -> Collection {
        let key = &self.config.collection_key;

        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("未找到已保存的图鉴 ({})，使用空集合", key);
                self.set_read_failure(None).await;
                return Vec::new();
            }
            Err(e) => {
                error!("读取图鉴失败，使用空集合并暂停写入: {}", e);
                self.set_read_failure(Some(e.to_string())).await;
                return Vec::new();
            }
        };

        match serde_json::from_str::<Collection>(&raw) {
            Ok(collection) => {
                info!("已加载图鉴: {} 个条目", collection.len());
                self.set_read_failure(None).await;
                collection
            }
            Err(e) => {
                warn!("图鉴文档解析失败，按空集合处理: {}", e);
                match self.recover_corrupt(&raw, e.to_string()).await {
                    Ok(()) => self.set_read_failure(None).await,
                    Err(backup_error) => {
                        error!("损坏文档未能备份，暂停写入: {}", backup_error);
                        self.set_read_failure(Some(backup_error.to_string())).await;
                    }
                }
                Vec::new()
            }
        }
    }

    async fn set_read_failure(&self, failure: Option<String>) {
        *self.read_failure.write().await = failure;
    }

    /// 是否允许写入（上次加载没有遗留未读出的文档）
    pub async fn is_writable(&self) -> bool {
        self.read_failure.read().await.is_none()
    }

    /// 丢弃损坏文档之前先备份
    ///
    /// 备份开启但失败时返回错误，调用方不能再覆盖原文档
    async fn recover_corrupt(&self, raw: &str, error: String) -> Result<()> {
        let backup_key = if self.config.backup_corrupt {
            let backup_key = self.config.backup_key();
            self.backup_document(&backup_key, raw).await?;
            warn!("损坏的图鉴文档已备份到 {}", backup_key);
            Some(backup_key)
        } else {
            None
        };

        if let Some(bus) = &self.event_bus {
            bus.publish(AppEvent::CollectionRecovered {
                key: self.config.collection_key.clone(),
                backup_key,
                error,
            });
        }
        Ok(())
    }

    /// 优先按原始字节复制，文档在此期间消失时写入已读到的文本
    async fn backup_document(&self, backup_key: &str, raw: &str) -> Result<()> {
        let copied = self
            .backend
            .copy(&self.config.collection_key, backup_key)
            .await
            .context("备份损坏的图鉴文档失败")?;
        if !copied {
            self.backend
                .set(backup_key, raw)
                .await
                .context("备份损坏的图鉴文档失败")?;
        }
        Ok(())
    }

    /// 序列化整个集合并写入后端（覆盖写，最后写入者生效）
    pub async fn save(&self, collection: &Collection) -> Result<()> {
        if let Some(failure) = self.read_failure.read().await.as_ref() {
            return Err(anyhow!(
                "已有图鉴文档未能读取，拒绝覆盖 ({}): {}",
                self.config.collection_key,
                failure
            ));
        }
        let json = serde_json::to_string(collection).context("序列化图鉴失败")?;
        self.backend
            .set(&self.config.collection_key, &json)
            .await
            .context("保存图鉴失败")?;
        debug!("图鉴已保存: {} 个条目", collection.len());
        Ok(())
    }

    /// 重新从后端加载并替换内存快照
    pub async fn reload(&self) -> Collection {
        let loaded = self.load().await;
        let mut entries = self.entries.write().await;
        *entries = loaded.clone();
        loaded
    }

    /// 把新条目插入到最新快照的首位并持久化
    ///
    /// 写锁覆盖“插入-保存-替换”全过程，并发提交不会丢失更新；
    /// 保存失败时快照保持不变
    pub async fn add(&self, entry: Entry) -> Result<Collection> {
        let mut entries = self.entries.write().await;

        if entries.iter().any(|existing| existing.id == entry.id) {
            return Err(anyhow!("条目 ID 重复: {}", entry.id));
        }

        let entry_id = entry.id.clone();
        let next = prepend(&entries, entry);
        self.save(&next).await?;
        *entries = next.clone();

        info!("新条目已加入图鉴: {} (共 {} 个)", entry_id, next.len());
        Ok(next)
    }

    /// 当前集合快照
    pub async fn entries(&self) -> Collection {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 按ID查找条目
    pub async fn get(&self, id: &str) -> Option<Entry> {
        self.entries
            .read()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }
}
