// 事件总线 - 用于模块间解耦通信
//
// 提交流水线、集合存储和界面之间通过发布/订阅传递状态变化
// 使用 tokio::sync::broadcast 分发事件

use tokio::sync::broadcast;

/// 应用事件枚举
#[derive(Debug, Clone)]
pub enum AppEvent {
    // --- 提交事件 ---

    /// 提交开始（图片已编码，开始调用分析服务）
    SubmissionStarted {
        submission_id: String,
    },

    /// 贴纸生成失败，条目将不带贴纸创建
    StickerDegraded {
        submission_id: String,
    },

    /// 新条目已写入集合
    EntryAdded {
        entry_id: String,
        total: usize,
    },

    /// 提交失败，集合未改变
    SubmissionFailed {
        submission_id: String,
        error: String,
    },

    // --- 集合事件 ---

    /// 持久化文档损坏，已按空集合处理
    CollectionRecovered {
        key: String,
        backup_key: Option<String>,
        error: String,
    },

    /// 详情视图选中的条目变化
    SelectionChanged {
        entry_id: Option<String>,
    },

    // --- 系统事件 ---

    /// 配置更新
    ConfigUpdated {
        config_type: String,
    },
}

/// 事件总线
///
/// 支持多个订阅者同时接收事件
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    /// 创建新的事件总线
    ///
    /// # 参数
    /// - `capacity`: 事件缓冲区大小
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件
    ///
    /// 没有订阅者时事件直接丢弃
    pub fn publish(&self, event: AppEvent) {
        match self.sender.send(event) {
            Ok(receiver_count) => {
                tracing::trace!("事件已发布，订阅者数量: {}", receiver_count);
            }
            Err(_) => {
                tracing::trace!("事件已发布但无订阅者");
            }
        }
    }

    /// 订阅事件
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// 获取当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}
