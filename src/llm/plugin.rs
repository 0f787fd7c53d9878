// LLM插件系统 - 定义分析服务接口和模型输出解析

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use llm_json::{loads, repair_json, RepairOptions};
use serde::de::DeserializeOwned;

use crate::models::{EncodedImage, SnowmanTraits};

/// 分析服务接口
///
/// 两个调用互相独立，提交流水线会并发发起。
/// `analyze` 失败必须返回错误；`generate_sticker` 失败只返回 None，不向上传播
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// 提供商名称
    fn name(&self) -> &str;

    /// 是否已完成配置（如 API key）
    fn is_configured(&self) -> bool {
        true
    }

    /// 分析照片，返回名称、稀有度、能力值等特征
    async fn analyze(&self, image: &EncodedImage) -> Result<SnowmanTraits>;

    /// 生成贴纸插画，返回纯 base64；任何内部失败都返回 None
    async fn generate_sticker(&self, image: &EncodedImage) -> Option<String>;
}

/// 去掉 ```json ... ``` 代码块包裹
pub fn strip_code_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let without_open = match trimmed.find('\n') {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed.trim_start_matches('`'),
    };
    without_open
        .trim_end()
        .trim_end_matches("```")
        .trim()
        .to_string()
}

/// 截取最外层的 JSON 对象
fn extract_object(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        (Some(start), _) => &text[start..],
        _ => text,
    }
}

/// 宽松解析模型返回的 JSON：先严格解析，失败后尝试修复
pub fn parse_model_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let cleaned = strip_code_fence(raw);
    if cleaned.is_empty() {
        return Err(anyhow!("模型没有返回内容"));
    }

    let candidate = extract_object(&cleaned);
    if let Ok(value) = serde_json::from_str::<T>(candidate) {
        return Ok(value);
    }

    let repaired = repair_json(candidate, &RepairOptions::default())
        .map_err(|e| anyhow!("无法修复模型返回的 JSON: {}", e))?;
    let value = loads(&repaired, &RepairOptions::default())
        .map_err(|e| anyhow!("解析修复后的 JSON 失败: {}", e))?;
    serde_json::from_value(value).map_err(|e| anyhow!("JSON 结构不符合预期: {}", e))
}

/// 解析分析结果
pub fn parse_traits(raw: &str) -> Result<SnowmanTraits> {
    parse_model_json::<SnowmanTraits>(raw)
}
