// Submission Status Actor - 使用Actor模式管理提交状态
//
// 界面据此显示加载遮罩并在分析期间禁用拍照

use crate::models::{SubmissionPhase, SubmissionStatus};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

/// 提交状态命令
pub enum SubmissionStatusCommand {
    /// 新提交开始（进入 Encoding）
    Begin {
        loading_message: String,
    },

    /// 更新阶段
    SetPhase {
        phase: SubmissionPhase,
    },

    /// 提交成功
    Succeeded {
        entry_id: String,
    },

    /// 提交失败
    Failed {
        error: String,
    },

    /// 获取状态
    Get {
        reply: oneshot::Sender<SubmissionStatus>,
    },

    /// 健康检查（Ping）
    HealthCheck { reply: oneshot::Sender<()> },
}

/// 提交状态Actor
pub struct SubmissionStatusActor {
    receiver: mpsc::Receiver<SubmissionStatusCommand>,
    status: SubmissionStatus,
}

impl SubmissionStatusActor {
    /// 创建新的Actor
    pub fn new() -> (Self, SubmissionStatusHandle) {
        let (sender, receiver) = mpsc::channel(50);
        let actor = Self {
            receiver,
            status: SubmissionStatus::default(),
        };
        let handle = SubmissionStatusHandle { sender };
        (actor, handle)
    }

    /// 创建并在后台任务中运行
    pub fn spawn() -> SubmissionStatusHandle {
        let (actor, handle) = Self::new();
        tokio::spawn(actor.run());
        handle
    }

    /// 一次提交结束，最后一个结束时回到 Idle
    fn finish(&mut self, outcome: SubmissionPhase) {
        self.status.in_flight = self.status.in_flight.saturating_sub(1);
        self.status.last_outcome = Some(outcome);
        self.status.last_finished_at = Some(Utc::now());
        if self.status.in_flight == 0 {
            self.status.phase = SubmissionPhase::Idle;
            self.status.loading_message = None;
        }
    }

    /// 运行Actor
    pub async fn run(mut self) {
        tracing::info!("Submission Status Actor 已启动");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                SubmissionStatusCommand::Begin { loading_message } => {
                    self.status.in_flight += 1;
                    self.status.phase = SubmissionPhase::Encoding;
                    self.status.loading_message = Some(loading_message);
                }

                SubmissionStatusCommand::SetPhase { phase } => {
                    self.status.phase = phase;
                }

                SubmissionStatusCommand::Succeeded { entry_id } => {
                    self.status.last_entry_id = Some(entry_id);
                    self.status.last_error = None;
                    self.finish(SubmissionPhase::Succeeded);
                }

                SubmissionStatusCommand::Failed { error } => {
                    self.status.last_error = Some(error);
                    self.finish(SubmissionPhase::Failed);
                }

                SubmissionStatusCommand::Get { reply } => {
                    let _ = reply.send(self.status.clone());
                }

                SubmissionStatusCommand::HealthCheck { reply } => {
                    let _ = reply.send(());
                }
            }
        }

        tracing::info!("Submission Status Actor 已停止");
    }
}

/// 提交状态Handle
#[derive(Clone)]
pub struct SubmissionStatusHandle {
    sender: mpsc::Sender<SubmissionStatusCommand>,
}

impl SubmissionStatusHandle {
    /// 标记新提交开始
    pub async fn begin(&self, loading_message: impl Into<String>) {
        let _ = self
            .sender
            .send(SubmissionStatusCommand::Begin {
                loading_message: loading_message.into(),
            })
            .await;
    }

    /// 更新阶段
    pub async fn set_phase(&self, phase: SubmissionPhase) {
        let _ = self
            .sender
            .send(SubmissionStatusCommand::SetPhase { phase })
            .await;
    }

    /// 标记提交成功
    pub async fn succeeded(&self, entry_id: String) {
        let _ = self
            .sender
            .send(SubmissionStatusCommand::Succeeded { entry_id })
            .await;
    }

    /// 标记提交失败
    pub async fn failed(&self, error: String) {
        let _ = self
            .sender
            .send(SubmissionStatusCommand::Failed { error })
            .await;
    }

    /// 获取提交状态
    pub async fn get(&self) -> SubmissionStatus {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(SubmissionStatusCommand::Get { reply })
            .await
            .ok();
        rx.await.unwrap_or_default()
    }

    /// 是否有提交在进行中
    pub async fn busy(&self) -> bool {
        self.get().await.is_analyzing()
    }

    /// 健康检查（1秒超时）
    pub async fn health_check(&self) -> bool {
        let (reply, rx) = oneshot::channel();
        if self
            .sender
            .send(SubmissionStatusCommand::HealthCheck { reply })
            .await
            .is_err()
        {
            return false;
        }
        matches!(
            tokio::time::timeout(std::time::Duration::from_secs(1), rx).await,
            Ok(Ok(()))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_cycle_returns_to_idle() {
        let handle = SubmissionStatusActor::spawn();

        handle.begin("눈사람 스캔 중...").await;
        let status = handle.get().await;
        assert_eq!(status.phase, SubmissionPhase::Encoding);
        assert_eq!(status.loading_message.as_deref(), Some("눈사람 스캔 중..."));
        assert!(handle.busy().await);

        handle.set_phase(SubmissionPhase::AwaitingAnalysis).await;
        assert_eq!(handle.get().await.phase, SubmissionPhase::AwaitingAnalysis);

        handle.succeeded("entry-1".to_string()).await;
        let status = handle.get().await;
        assert_eq!(status.phase, SubmissionPhase::Idle);
        assert_eq!(status.last_outcome, Some(SubmissionPhase::Succeeded));
        assert_eq!(status.last_entry_id.as_deref(), Some("entry-1"));
        assert!(status.loading_message.is_none());
        assert!(!handle.busy().await);
    }

    #[tokio::test]
    async fn test_failure_is_recorded() {
        let handle = SubmissionStatusActor::spawn();

        handle.begin("scan").await;
        handle.failed("분석 실패".to_string()).await;

        let status = handle.get().await;
        assert_eq!(status.phase, SubmissionPhase::Idle);
        assert_eq!(status.last_outcome, Some(SubmissionPhase::Failed));
        assert_eq!(status.last_error.as_deref(), Some("분석 실패"));
    }

    #[tokio::test]
    async fn test_overlapping_submissions_stay_busy() {
        let handle = SubmissionStatusActor::spawn();

        handle.begin("a").await;
        handle.begin("b").await;
        handle.succeeded("1".to_string()).await;
        assert!(handle.busy().await);

        handle.succeeded("2".to_string()).await;
        assert!(!handle.busy().await);
    }

    #[tokio::test]
    async fn test_health_check() {
        let handle = SubmissionStatusActor::spawn();
        assert!(handle.health_check().await);

        let (actor, stopped) = SubmissionStatusActor::new();
        drop(actor);
        assert!(!stopped.health_check().await);
    }
}
