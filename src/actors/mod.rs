// Actor模块 - 使用Actor模式管理并发状态
//
// 通过消息传递更新状态，避免在界面状态上加锁

pub mod submission_status;

pub use submission_status::{
    SubmissionStatusActor, SubmissionStatusCommand, SubmissionStatusHandle,
};
