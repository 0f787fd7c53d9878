// 领域模块 - 用于组织应用的业务逻辑
//
// 按业务领域拆分：图鉴集合、选中状态、统计、提交流水线

pub mod collection;
pub mod selection;
pub mod stats;
pub mod submission;

pub use collection::CollectionDomain;
pub use selection::SelectionState;
pub use stats::{category_count, empty_slots, format_count, total_count, CollectionStats};
pub use submission::{SubmissionError, SubmissionPipeline, USER_FAILURE_MESSAGE};
