//! 文件系统路径工具
//!
//! 定位跨平台的数据目录和日志目录

use std::path::PathBuf;

const APP_DIR_NAME: &str = "snowman-dex";

/// 获取数据目录路径（跨平台）
///
/// 可通过环境变量 SNOWMAN_DEX_HOME 覆盖
/// - macOS: ~/Library/Application Support/snowman-dex
/// - Windows: %APPDATA%/snowman-dex
/// - Linux: ~/.local/share/snowman-dex
pub fn get_data_dir() -> PathBuf {
    if let Ok(custom) = std::env::var("SNOWMAN_DEX_HOME") {
        if !custom.trim().is_empty() {
            return PathBuf::from(custom);
        }
    }

    if cfg!(target_os = "macos") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join("Library/Application Support")
            .join(APP_DIR_NAME)
    } else if cfg!(target_os = "windows") {
        let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(appdata).join(APP_DIR_NAME)
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local/share").join(APP_DIR_NAME)
    }
}

/// 获取日志目录路径
///
/// macOS 放在 ~/Library/Logs 下，其余平台放在数据目录的 logs 子目录
pub fn get_log_dir() -> PathBuf {
    if cfg!(target_os = "macos") && std::env::var("SNOWMAN_DEX_HOME").is_err() {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        return PathBuf::from(home).join("Library/Logs").join(APP_DIR_NAME);
    }
    get_data_dir().join("logs")
}
