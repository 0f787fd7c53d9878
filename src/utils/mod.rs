//! 工具函数模块
//!
//! 提供各类通用工具函数，包括：
//! - 图片编码（data URI / base64）
//! - 输入验证
//! - 数据与日志目录定位

pub mod file_system;
pub mod image_codec;
pub mod validation;

// 重新导出常用函数
pub use file_system::*;
pub use image_codec::*;
pub use validation::*;
