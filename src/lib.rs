// 雪人图鉴 - 核心库

// 声明模块
pub mod actors;
pub mod app;
pub mod domains;
pub mod event_bus;
pub mod llm;
pub mod logger;
pub mod models;
pub mod settings;
pub mod storage;
pub mod utils;

use std::sync::Arc;

use domains::{CollectionDomain, SubmissionPipeline};
use event_bus::EventBus;
use settings::SettingsManager;

/// 应用状态（按领域分组）
///
/// - 图鉴领域：集合存储与详情选中
/// - 提交流水线：拍照 → 分析 → 入库
/// - 设置管理
/// - 事件总线：领域间解耦通信
#[derive(Clone)]
pub struct AppState {
    /// 图鉴领域管理器
    pub collection: Arc<CollectionDomain>,
    /// 提交流水线
    pub pipeline: Arc<SubmissionPipeline>,
    /// 设置管理器
    pub settings: Arc<SettingsManager>,
    /// 事件总线
    pub event_bus: Arc<EventBus>,
}
