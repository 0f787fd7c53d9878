// 提交流水线 - 拍照 → 分析 → 入库
//
// 一次提交：编码图片后并发调用分析和贴纸生成，两者都结束后再组装条目。
// 分析失败则整个提交失败且集合不变；贴纸失败只降级为无贴纸

use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::collection::CollectionDomain;
use crate::actors::SubmissionStatusHandle;
use crate::event_bus::{AppEvent, EventBus};
use crate::llm::AnalysisGateway;
use crate::models::{EncodedImage, Entry, SnowmanTraits, SubmissionPhase};
use crate::storage::now_millis;
use crate::utils::encode_image;

/// 加载遮罩上的提示
pub const LOADING_MESSAGE: &str = "눈사람 스캔 중...";

/// 任何失败都只向用户显示这一条通用提示
pub const USER_FAILURE_MESSAGE: &str = "오류가 발생했습니다. 다시 시도해 주세요!";

/// 提交失败
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("图片编码失败: {0}")]
    Encoding(String),
    #[error("分析失败: {0}")]
    Analysis(String),
    #[error("保存图鉴失败: {0}")]
    Persistence(String),
}

impl SubmissionError {
    /// 面向用户的通用提示
    pub fn user_message(&self) -> &'static str {
        USER_FAILURE_MESSAGE
    }
}

/// 提交流水线
pub struct SubmissionPipeline {
    gateway: Arc<dyn AnalysisGateway>,
    collection: Arc<CollectionDomain>,
    status: SubmissionStatusHandle,
    event_bus: Arc<EventBus>,
}

impl SubmissionPipeline {
    pub fn new(
        gateway: Arc<dyn AnalysisGateway>,
        collection: Arc<CollectionDomain>,
        status: SubmissionStatusHandle,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            gateway,
            collection,
            status,
            event_bus,
        }
    }

    pub fn status(&self) -> &SubmissionStatusHandle {
        &self.status
    }

    /// 提交一张照片，成功时返回新条目（同时成为当前选中）
    pub async fn submit(&self, image: &[u8]) -> Result<Entry, SubmissionError> {
        let submission_id = Uuid::new_v4().simple().to_string();
        self.status.begin(LOADING_MESSAGE).await;

        let result = self.run(&submission_id, image).await;

        match &result {
            Ok(entry) => {
                info!("提交 {} 完成: {} ({})", submission_id, entry.name, entry.id);
                self.status.succeeded(entry.id.clone()).await;
            }
            Err(e) => {
                error!("提交 {} 失败: {}", submission_id, e);
                self.status.failed(e.to_string()).await;
                self.event_bus.publish(AppEvent::SubmissionFailed {
                    submission_id,
                    error: e.to_string(),
                });
            }
        }

        result
    }

    async fn run(&self, submission_id: &str, image: &[u8]) -> Result<Entry, SubmissionError> {
        // 编码必须在任何网络调用之前完成
        let encoded = encode_image(image).map_err(|e| SubmissionError::Encoding(e.to_string()))?;
        let encoded = Arc::new(encoded);

        self.status.set_phase(SubmissionPhase::AwaitingAnalysis).await;
        self.event_bus.publish(AppEvent::SubmissionStarted {
            submission_id: submission_id.to_string(),
        });
        info!(
            "提交 {}: 调用 {} 分析 ({}, {} 字节 base64)",
            submission_id,
            self.gateway.name(),
            encoded.mime_type,
            encoded.data.len()
        );

        let (traits, sticker) = self.fan_out(encoded.clone()).await;
        let traits = traits?;

        if sticker.is_none() {
            warn!("提交 {}: 贴纸不可用，条目将只保存原图", submission_id);
            self.event_bus.publish(AppEvent::StickerDegraded {
                submission_id: submission_id.to_string(),
            });
        }

        let timestamp = now_millis();
        let entry = Entry::from_traits(
            new_entry_id(timestamp),
            timestamp,
            encoded.data_uri(),
            sticker,
            traits,
        );

        self.collection
            .add_entry(entry.clone())
            .await
            .map_err(|e| SubmissionError::Persistence(e.to_string()))?;
        self.collection.show_entry(entry.clone()).await;

        Ok(entry)
    }

    /// 并发发起两个调用并等待两者都结束
    ///
    /// 分析任务的错误或异常终止会使提交失败；贴纸任务的任何问题都降级为 None
    async fn fan_out(
        &self,
        image: Arc<EncodedImage>,
    ) -> (Result<SnowmanTraits, SubmissionError>, Option<String>) {
        let analysis_task = {
            let gateway = self.gateway.clone();
            let image = image.clone();
            tokio::spawn(async move { gateway.analyze(&image).await })
        };
        let sticker_task = {
            let gateway = self.gateway.clone();
            tokio::spawn(async move { gateway.generate_sticker(&image).await })
        };

        let (analysis, sticker) = tokio::join!(analysis_task, sticker_task);

        let traits = match analysis {
            Ok(Ok(traits)) => Ok(traits),
            Ok(Err(e)) => Err(SubmissionError::Analysis(e.to_string())),
            Err(e) => Err(SubmissionError::Analysis(format!("分析任务异常终止: {}", e))),
        };

        let sticker = match sticker {
            Ok(Some(data)) if !data.trim().is_empty() => Some(data),
            Ok(_) => None,
            Err(e) => {
                warn!("贴纸任务异常终止: {}", e);
                None
            }
        };

        (traits, sticker)
    }
}

/// 以创建时间开头的条目ID，后缀避免同一毫秒内冲突
fn new_entry_id(timestamp: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", timestamp, &suffix[..8])
}
