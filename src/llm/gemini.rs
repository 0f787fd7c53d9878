// Google Gemini 提供商实现 - 图片分析与贴纸生成

use super::plugin::*;
use super::GeminiConfig;
use crate::models::{EncodedImage, Rarity, SnowmanTraits};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

const ANALYSIS_PROMPT: &str = "이 눈사람 사진을 '눈사람 도감'용으로 분석해줘. 특징을 파악하고 판타지 RPG 스타일의 희귀도를 부여하며 능력치를 생성해줘. 모든 텍스트(이름, 설명, 타입, 재미있는 사실)는 반드시 한국어로 작성하고, 매우 재치 있고 창의적이어야 해.";

const STICKER_PROMPT: &str = "Transform this snowman into a cute, clean, flat vector art sticker. White background. Thick outline. Pokemon-style illustration. Minimalist and colorful.";

/// Gemini 提供商
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// 创建提供商（接受共享的HTTP客户端以复用连接池）
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    /// 分析结果的响应结构约束
    fn traits_schema() -> Value {
        let rarities: Vec<&str> = Rarity::ALL.iter().map(Rarity::as_str).collect();
        json!({
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING", "description": "눈사람에게 어울리는 창의적이고 재미있는 한국어 이름" },
                "description": { "type": "STRING", "description": "포켓몬 도감 스타일의 짧고 재치 있는 한국어 설명" },
                "type": { "type": "STRING", "description": "속성이나 스타일 (예: '클래식', '진흙', '추상적', '꼬마'). 한국어로 작성" },
                "rarity": {
                    "type": "STRING",
                    "enum": rarities,
                    "description": "복잡도와 노력에 따른 희귀도 등급"
                },
                "stats": {
                    "type": "OBJECT",
                    "properties": {
                        "creativity": { "type": "INTEGER", "description": "창의성 점수 1-100" },
                        "roundness": { "type": "INTEGER", "description": "동글동글함 점수 1-100" },
                        "accessories": { "type": "INTEGER", "description": "악세서리 활용 점수 1-100" },
                        "chillFactor": { "type": "INTEGER", "description": "분위기/여유 점수 1-100" },
                        "durability": { "type": "INTEGER", "description": "예상 내구도 점수 1-100" }
                    },
                    "required": ["creativity", "roundness", "accessories", "chillFactor", "durability"]
                },
                "funFact": { "type": "STRING", "description": "이 눈사람에 대한 재미있는 한국어 티엠아이(TMI)" }
            },
            "required": ["name", "description", "type", "rarity", "stats", "funFact"]
        })
    }

    fn image_part(image: &EncodedImage) -> Value {
        json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.data
            }
        })
    }

    pub(crate) fn build_analysis_request(&self, image: &EncodedImage) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    Self::image_part(image),
                    { "text": ANALYSIS_PROMPT }
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": Self::traits_schema(),
                "temperature": self.config.temperature
            }
        })
    }

    pub(crate) fn build_sticker_request(&self, image: &EncodedImage) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [
                    Self::image_part(image),
                    { "text": STICKER_PROMPT }
                ]
            }],
            "generationConfig": {
                "responseModalities": ["TEXT", "IMAGE"],
                "imageConfig": { "aspectRatio": "1:1" }
            }
        })
    }

    /// 调用 generateContent 接口
    async fn call_gemini_api(&self, model: &str, body: &Value) -> Result<GeminiResponse> {
        let api_key = self
            .config
            .resolve_api_key()
            .ok_or_else(|| anyhow!("Gemini API key未配置"))?;

        let start_time = std::time::Instant::now();
        let endpoint = self.endpoint(model);
        debug!("调用Gemini API: model={}, endpoint={}", model, endpoint);

        let response = self
            .client
            .post(&endpoint)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API错误 ({}): {}", status, error_text);
            return Err(anyhow!("Gemini API调用失败 ({}): {}", status, error_text));
        }

        let response_text = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| anyhow!("解析Gemini响应失败: {}", e))?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini 调用完成: model={}, 耗时 {}ms, tokens={:?}",
                model,
                start_time.elapsed().as_millis(),
                usage.total_token_count
            );
        }

        Ok(parsed)
    }
}

#[async_trait]
impl AnalysisGateway for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    fn is_configured(&self) -> bool {
        self.config.resolve_api_key().is_some()
    }

    async fn analyze(&self, image: &EncodedImage) -> Result<SnowmanTraits> {
        if !self.is_configured() {
            return Err(anyhow!("Gemini API key未配置，请先配置 API key"));
        }

        info!("Gemini开始分析图片 ({})", image.mime_type);
        let body = self.build_analysis_request(image);
        let response = self
            .call_gemini_api(&self.config.analysis_model, &body)
            .await?;

        let text = response
            .first_text()
            .ok_or_else(|| anyhow!("Gemini 没有返回文本结果"))?;
        let traits = parse_traits(&text)?;

        info!("分析成功: {} ({})", traits.name, traits.rarity);
        Ok(traits)
    }

    async fn generate_sticker(&self, image: &EncodedImage) -> Option<String> {
        if !self.is_configured() {
            warn!("Gemini API key未配置，跳过贴纸生成");
            return None;
        }

        let body = self.build_sticker_request(image);
        match self.call_gemini_api(&self.config.sticker_model, &body).await {
            Ok(response) => match response.first_inline_data() {
                Some(data) => {
                    info!("贴纸生成成功 ({} 字节 base64)", data.len());
                    Some(data)
                }
                None => {
                    warn!("贴纸生成失败: 响应中没有图片");
                    None
                }
            },
            Err(e) => {
                warn!("贴纸生成失败: {}", e);
                None
            }
        }
    }
}

/// Gemini API 响应
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    total_token_count: Option<u64>,
}

impl GeminiResponse {
    fn first_parts(&self) -> &[GeminiPart] {
        let Some(candidate) = self.candidates.first() else {
            return &[];
        };
        if let Some(reason) = &candidate.finish_reason {
            if reason != "STOP" {
                warn!("Gemini 响应结束原因: {}", reason);
            }
        }
        candidate
            .content
            .as_ref()
            .map(|content| content.parts.as_slice())
            .unwrap_or(&[])
    }

    /// 第一个候选中拼接后的文本
    pub(crate) fn first_text(&self) -> Option<String> {
        let text: String = self
            .first_parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// 第一个候选中的第一张内联图片
    pub(crate) fn first_inline_data(&self) -> Option<String> {
        self.first_parts()
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .map(|inline| inline.data.trim().to_string())
            .find(|data| !data.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rarity;

    fn provider(api_key: &str) -> GeminiProvider {
        let config = GeminiConfig {
            api_key: api_key.to_string(),
            ..GeminiConfig::default()
        };
        GeminiProvider::new(Client::new(), config)
    }

    fn image() -> EncodedImage {
        EncodedImage {
            mime_type: "image/jpeg".to_string(),
            data: "/9j/4AAQ".to_string(),
        }
    }

    #[test]
    fn test_endpoint() {
        let provider = provider("key");
        assert_eq!(
            provider.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_analysis_request_shape() {
        let body = provider("key").build_analysis_request(&image());
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[0]["inlineData"]["data"], "/9j/4AAQ");
        assert!(parts[1]["text"].as_str().unwrap().contains("눈사람 도감"));

        let config = &body["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["properties"]["rarity"]["enum"][4], "Mythical");
    }

    #[test]
    fn test_sticker_request_shape() {
        let body = provider("key").build_sticker_request(&image());
        assert_eq!(body["generationConfig"]["imageConfig"]["aspectRatio"], "1:1");
        assert!(body["contents"][0]["parts"][1]["text"]
            .as_str()
            .unwrap()
            .contains("sticker"));
    }

    #[test]
    fn test_response_text_to_traits() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"name\":\"눈덩이\",\"description\":\"d\",\"type\":\"꼬마\",\"rarity\":\"Mythical\",\"stats\":{\"creativity\":1,\"roundness\":2,\"accessories\":3,\"chillFactor\":4,\"durability\":5},\"funFact\":\"f\"}" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "totalTokenCount": 321 }
        }))
        .unwrap();

        let traits = parse_traits(&response.first_text().unwrap()).unwrap();
        assert_eq!(traits.rarity, Rarity::Mythical);
        assert_eq!(traits.kind, "꼬마");
    }

    #[test]
    fn test_response_inline_data() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your sticker" },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } }
                ] }
            }]
        }))
        .unwrap();

        assert_eq!(response.first_inline_data().as_deref(), Some("iVBORw0KGgo="));
    }

    #[test]
    fn test_empty_response() {
        let response = GeminiResponse::default();
        assert!(response.first_text().is_none());
        assert!(response.first_inline_data().is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_provider() {
        let provider = GeminiProvider::new(
            Client::new(),
            GeminiConfig {
                api_key: String::new(),
                api_key_env: None,
                ..GeminiConfig::default()
            },
        );
        assert!(!provider.is_configured());
        assert!(provider.analyze(&image()).await.is_err());
        assert!(provider.generate_sticker(&image()).await.is_none());
    }
}
