//! 图片编码工具
//!
//! 把拍摄的原始字节转换为分析服务需要的 base64 / data URI 形式

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;

use crate::models::EncodedImage;

/// 无法识别格式时使用的 MIME 类型
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// 根据文件头推断 MIME 类型
pub fn detect_mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        _ => FALLBACK_MIME_TYPE,
    }
}

/// 编码原始图片字节
pub fn encode_image(bytes: &[u8]) -> Result<EncodedImage> {
    if bytes.is_empty() {
        return Err(anyhow!("图片内容为空"));
    }

    Ok(EncodedImage {
        mime_type: detect_mime_type(bytes).to_string(),
        data: general_purpose::STANDARD.encode(bytes),
    })
}

/// 拆分 data URI，返回 (MIME 类型, base64 内容)
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, data))
}

/// 解码纯 base64 内容
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| anyhow!("base64 解码失败: {}", e))
}
