// 日志初始化 - 同时输出到控制台和按天轮转的文件

use anyhow::{anyhow, Result};
use std::path::Path;
use time::format_description::BorrowedFormatItem;
use tracing::Level;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// 日志文件名前缀
const LOG_FILE_NAME: &str = "snowman-dex.log";

/// 日志时间戳格式，精确到毫秒
fn timestamp_format() -> Result<Vec<BorrowedFormatItem<'static>>> {
    time::format_description::parse_borrowed::<2>(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]",
    )
    .map_err(|e| anyhow!("日志时间格式无效: {}", e))
}

/// 初始化日志系统
///
/// 文件写入使用非阻塞 writer，guard 在整个进程生命周期内保留
pub fn init(log_dir: &Path, level: Level) -> Result<()> {
    std::fs::create_dir_all(log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    std::mem::forget(guard);

    // 控制台只输出 WARN 及以上，避免干扰命令行输出；文件记录完整日志
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(non_blocking.with_max_level(level));

    let timer = LocalTime::new(timestamp_format()?);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_timer(timer)
        .with_ansi(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("设置全局日志失败: {}", e))?;

    tracing::debug!("日志文件位置: {:?}", log_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_timestamp_format_has_millis() {
        let format = timestamp_format().unwrap();
        let formatted = datetime!(2026-01-02 03:04:05.678 UTC)
            .format(format.as_slice())
            .unwrap();
        assert_eq!(formatted, "2026-01-02 03:04:05.678");
    }
}
