//! 应用程序初始化
//!
//! 负责把各领域模块组装成一个可用的应用实例：
//! - 配置加载
//! - 集合存储恢复
//! - 分析服务与 HTTP 客户端
//! - Actor 启动

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::actors::SubmissionStatusActor;
use crate::domains::{CollectionDomain, SubmissionPipeline};
use crate::event_bus::EventBus;
use crate::llm::{self, AnalysisGateway};
use crate::settings::SettingsManager;
use crate::storage::{EntryStore, FileKvStore, KeyValueStore};
use crate::AppState;

/// 设置文件名
const SETTINGS_FILE: &str = "settings.json";

/// 应用入口：按数据目录初始化所有模块
///
/// 需要在 tokio 运行时中调用（会启动状态 Actor）
pub async fn bootstrap(data_dir: &Path) -> Result<AppState> {
    info!("初始化雪人图鉴，数据目录: {:?}", data_dir);

    let settings = Arc::new(
        SettingsManager::new(data_dir.join(SETTINGS_FILE))
            .await
            .context("加载设置失败")?,
    );
    let config = settings.get().await;

    let client = llm::build_http_client(&config.llm).context("无法创建 HTTP 客户端")?;
    let gateway = llm::build_gateway(client, &config.llm)?;

    let backend: Arc<dyn KeyValueStore> = Arc::new(FileKvStore::new(data_dir.join("store")).await?);

    bootstrap_with(settings, backend, gateway).await
}

/// 使用给定的存储后端和分析服务组装应用（便于替换实现）
pub async fn bootstrap_with(
    settings: Arc<SettingsManager>,
    backend: Arc<dyn KeyValueStore>,
    gateway: Arc<dyn AnalysisGateway>,
) -> Result<AppState> {
    let config = settings.get().await;
    let event_bus = Arc::new(EventBus::new(256));

    let store = Arc::new(
        EntryStore::open(backend, config.storage.clone(), Some(event_bus.clone())).await,
    );
    info!("图鉴已恢复: {} 个条目", store.len().await);
    if !store.is_writable().await {
        warn!("图鉴文档未能读取，新的提交将无法保存");
    }

    let collection = Arc::new(CollectionDomain::new(
        store,
        event_bus.clone(),
        config.grid_min_slots,
    ));

    let status = SubmissionStatusActor::spawn();
    let pipeline = Arc::new(SubmissionPipeline::new(
        gateway,
        collection.clone(),
        status,
        event_bus.clone(),
    ));

    Ok(AppState {
        collection,
        pipeline,
        settings,
        event_bus,
    })
}

/// 默认数据目录
pub fn default_data_dir() -> PathBuf {
    crate::utils::get_data_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EncodedImage, Rarity, SnowmanStats, SnowmanTraits};
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct FixedGateway;

    #[async_trait]
    impl AnalysisGateway for FixedGateway {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn analyze(&self, _image: &EncodedImage) -> anyhow::Result<SnowmanTraits> {
            Ok(SnowmanTraits {
                name: "꼬마 눈사람".to_string(),
                description: "작지만 용감하다".to_string(),
                kind: "꼬마".to_string(),
                rarity: Rarity::Uncommon,
                stats: SnowmanStats {
                    creativity: 33,
                    roundness: 66,
                    accessories: 11,
                    chill_factor: 99,
                    durability: 22,
                },
                fun_fact: "장갑 한 짝을 잃어버렸다".to_string(),
            })
        }

        async fn generate_sticker(&self, _image: &EncodedImage) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn test_state_survives_restart() {
        let temp_dir = tempdir().unwrap();
        let settings = Arc::new(
            SettingsManager::new(temp_dir.path().join(SETTINGS_FILE))
                .await
                .unwrap(),
        );
        let backend: Arc<dyn KeyValueStore> =
            Arc::new(FileKvStore::new(temp_dir.path().join("store")).await.unwrap());

        let state = bootstrap_with(settings.clone(), backend.clone(), Arc::new(FixedGateway))
            .await
            .unwrap();
        let entry = state.pipeline.submit(&[0xFF, 0xD8, 0xFF, 0xE0]).await.unwrap();

        let restarted = bootstrap_with(settings, backend, Arc::new(FixedGateway))
            .await
            .unwrap();
        let entries = restarted.collection.entries().await;
        assert_eq!(entries, vec![entry]);
        // 重启后没有选中
        assert!(restarted.collection.selected().await.is_none());
    }

    #[tokio::test]
    async fn test_bootstrap_from_data_dir() {
        let temp_dir = tempdir().unwrap();
        let state = bootstrap(temp_dir.path()).await.unwrap();

        assert!(state.collection.entries().await.is_empty());
        assert!(temp_dir.path().join(SETTINGS_FILE).exists());
        assert!(temp_dir.path().join("store").is_dir());
    }
}
