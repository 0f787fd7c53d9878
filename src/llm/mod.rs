// LLM模块 - 管理AI分析服务

pub mod gemini;
pub mod plugin;

pub use gemini::GeminiProvider;
pub use plugin::{parse_traits, AnalysisGateway};

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// LLM配置
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LLMConfig {
    /// 当前使用的 provider，目前只支持 "gemini"
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Gemini配置
    #[serde(default)]
    pub gemini: GeminiConfig,
}

fn default_provider() -> String {
    "gemini".to_string()
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Gemini配置
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeminiConfig {
    /// 为空时从 api_key_env 指定的环境变量读取
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: Option<String>,
    /// 分析用模型
    #[serde(default = "default_analysis_model")]
    pub analysis_model: String,
    /// 贴纸生成用模型
    #[serde(default = "default_sticker_model")]
    pub sticker_model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_key_env() -> Option<String> {
    Some("GEMINI_API_KEY".to_string())
}

fn default_analysis_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_sticker_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_temperature() -> f32 {
    0.8
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_key_env: default_api_key_env(),
            analysis_model: default_analysis_model(),
            sticker_model: default_sticker_model(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GeminiConfig {
    /// 实际使用的 API key：配置优先，其次环境变量
    pub fn resolve_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }

        self.api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// 创建共享的 HTTP 客户端
pub fn build_http_client(config: &LLMConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(config.gemini.request_timeout())
        .pool_max_idle_per_host(4)
        .build()?;
    Ok(client)
}

/// 根据配置创建分析服务
pub fn build_gateway(
    client: reqwest::Client,
    config: &LLMConfig,
) -> Result<Arc<dyn AnalysisGateway>> {
    match config.provider.as_str() {
        "gemini" | "google" => {
            let provider = GeminiProvider::new(client, config.gemini.clone());
            info!(
                "使用 Gemini provider: analysis_model={}, sticker_model={}, api_key_configured={}",
                config.gemini.analysis_model,
                config.gemini.sticker_model,
                provider.is_configured()
            );
            Ok(Arc::new(provider))
        }
        other => Err(anyhow!("不支持的 provider: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_fill_missing_fields() {
        let config: LLMConfig = serde_json::from_str(r#"{"gemini": {"api_key": "abc"}}"#).unwrap();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.gemini.api_key, "abc");
        assert_eq!(config.gemini.analysis_model, "gemini-2.5-flash");
        assert_eq!(config.gemini.sticker_model, "gemini-2.5-flash-image");
        assert_eq!(config.gemini.request_timeout_secs, 120);
    }

    #[test]
    fn test_stored_api_key_wins() {
        let config = GeminiConfig {
            api_key: "  stored  ".to_string(),
            api_key_env: Some("SNOWMAN_DEX_TEST_UNSET_KEY".to_string()),
            ..GeminiConfig::default()
        };
        assert_eq!(config.resolve_api_key().as_deref(), Some("stored"));
    }

    #[test]
    fn test_missing_api_key() {
        let config = GeminiConfig {
            api_key: String::new(),
            api_key_env: Some("SNOWMAN_DEX_TEST_UNSET_KEY".to_string()),
            ..GeminiConfig::default()
        };
        assert!(config.resolve_api_key().is_none());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let config = LLMConfig {
            provider: "qwen".to_string(),
            ..LLMConfig::default()
        };
        assert!(build_gateway(reqwest::Client::new(), &config).is_err());
    }

    #[test]
    fn test_build_gemini_gateway() {
        let config = LLMConfig::default();
        let client = build_http_client(&config).unwrap();
        let gateway = build_gateway(client, &config).unwrap();
        assert_eq!(gateway.name(), "Gemini");
    }
}
