//! 输入验证工具函数

/// 验证条目ID是否有效
///
/// 条目ID由时间戳和随机后缀组成，只允许字母、数字和连字符
pub fn validate_entry_id(id: &str) -> Result<(), String> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err("条目 ID 不能为空".to_string());
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(format!("无效的条目 ID: {}", id));
    }
    Ok(())
}
