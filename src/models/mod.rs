// 数据模型模块 - 定义所有的数据结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// 重新导出其他模块的类型
pub use crate::llm::{GeminiConfig, LLMConfig};
pub use crate::storage::StorageConfig;

#[cfg(test)]
pub(crate) mod strategies;

/// 稀有度（封闭枚举，序列化为首字母大写的英文）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
    Mythical,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Legendary,
        Rarity::Mythical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Legendary => "Legendary",
            Self::Mythical => "Mythical",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 五项能力值
///
/// 预期范围 1-100，但分析结果原样保存，不做截断或校验
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowmanStats {
    pub creativity: i32,
    pub roundness: i32,
    pub accessories: i32,
    pub chill_factor: i32,
    pub durability: i32,
}

/// 分析服务返回的特征
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnowmanTraits {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rarity: Rarity,
    pub stats: SnowmanStats,
    pub fun_fact: String,
}

/// 图鉴条目（创建后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rarity: Rarity,
    pub stats: SnowmanStats,
    pub fun_fact: String,
    /// 原始照片，data URI 形式
    pub image_url: String,
    /// 生成的贴纸，纯 base64（无 data URI 前缀）
    ///
    /// 读取时只把旧版的空字符串 "" 视为缺失；新条目不会带空贴纸，见 `from_traits`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_sticker"
    )]
    pub sticker_url: Option<String>,
    /// 创建时间（毫秒时间戳）
    pub timestamp: i64,
}

impl Entry {
    /// 由分析结果组装新条目，id 和时间戳由调用方提供
    ///
    /// 空白贴纸按缺失处理
    pub fn from_traits(
        id: String,
        timestamp: i64,
        image_url: String,
        sticker_url: Option<String>,
        traits: SnowmanTraits,
    ) -> Self {
        Self {
            id,
            name: traits.name,
            description: traits.description,
            kind: traits.kind,
            rarity: traits.rarity,
            stats: traits.stats,
            fun_fact: traits.fun_fact,
            image_url,
            sticker_url: sticker_url.filter(|s| !s.trim().is_empty()),
            timestamp,
        }
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.timestamp)
    }

    pub fn has_sticker(&self) -> bool {
        self.sticker_url.is_some()
    }
}

/// 旧版数据里贴纸生成失败时保存的是空字符串，读取时视为缺失
fn deserialize_sticker<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// 图鉴集合，最新的在最前
pub type Collection = Vec<Entry>;

/// 发送给分析服务的图片编码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// MIME 类型，如 image/jpeg
    pub mime_type: String,
    /// 纯 base64 内容
    pub data: String,
}

impl EncodedImage {
    /// 完整的 data URI
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// 单次提交的状态机：Idle -> Encoding -> AwaitingAnalysis -> Succeeded/Failed -> Idle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Encoding,
    AwaitingAnalysis,
    Succeeded,
    Failed,
}

/// 提交状态（供界面显示加载遮罩、禁用拍照按钮）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionStatus {
    /// 当前阶段（没有提交在进行时为 Idle）
    pub phase: SubmissionPhase,
    /// 最近一次完成的提交结果（Succeeded 或 Failed）
    pub last_outcome: Option<SubmissionPhase>,
    /// 正在进行的提交数量
    pub in_flight: usize,
    /// 加载提示文案
    pub loading_message: Option<String>,
    /// 最近成功的条目ID
    pub last_entry_id: Option<String>,
    /// 最近一次完成时间
    pub last_finished_at: Option<DateTime<Utc>>,
    /// 错误信息
    pub last_error: Option<String>,
}

impl SubmissionStatus {
    /// 是否有提交在进行中
    pub fn is_analyzing(&self) -> bool {
        self.in_flight > 0
    }
}

/// 应用配置（部分更新）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub gemini: Option<GeminiConfig>,
    pub storage: Option<StorageConfig>,
    pub grid_min_slots: Option<usize>,
}

/// 持久化的应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedAppConfig {
    /// LLM配置
    #[serde(default)]
    pub llm: LLMConfig,
    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,
    /// 网格最少格子数
    #[serde(default = "default_grid_min_slots")]
    pub grid_min_slots: usize,
}

fn default_grid_min_slots() -> usize {
    12
}

impl Default for PersistedAppConfig {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            storage: StorageConfig::default(),
            grid_min_slots: default_grid_min_slots(),
        }
    }
}
