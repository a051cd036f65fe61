use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, IntoStaticStr};

const PNG_MAGIC: &[u8] = b"\x89PNG";
const JPEG_MAGIC: &[u8] = b"\xff\xd8";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Unknown,
}

/// Detect the image format from its leading magic bytes.
pub fn detect_format(bytes: &[u8]) -> ImageFormat {
    if bytes.len() < 4 {
        return ImageFormat::Unknown;
    }
    if bytes.starts_with(PNG_MAGIC) {
        ImageFormat::Png
    } else if bytes.starts_with(JPEG_MAGIC) {
        ImageFormat::Jpeg
    } else {
        ImageFormat::Unknown
    }
}

/// True when the bytes look like a PNG or JPEG image.
pub fn is_valid(bytes: &[u8]) -> bool {
    detect_format(bytes) != ImageFormat::Unknown
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded.trim())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotMetadata {
    pub size_bytes: usize,
    pub format: ImageFormat,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub timestamp: DateTime<Utc>,
    pub url: Option<String>,
}

impl ScreenshotMetadata {
    /// Dimensions are read from the IHDR chunk for PNG images only.
    pub fn extract(bytes: &[u8], url: Option<String>) -> Self {
        let format = detect_format(bytes);
        let (width, height) = match format {
            ImageFormat::Png => png_dimensions(bytes).map_or((None, None), |(w, h)| (Some(w), Some(h))),
            _ => (None, None),
        };
        Self {
            size_bytes: bytes.len(),
            format,
            width,
            height,
            timestamp: Utc::now(),
            url,
        }
    }
}

// 8-byte signature, 4-byte length, "IHDR", then big-endian width and height.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

/// Build the `{base64, format, metadata?}` payload handed to a vision model.
pub fn prepare_for_vision_model(bytes: &[u8], include_metadata: bool) -> Value {
    let mut payload = json!({
        "base64": encode_base64(bytes),
        "format": detect_format(bytes),
    });
    if include_metadata {
        payload["metadata"] = json!(ScreenshotMetadata::extract(bytes, None));
    }
    payload
}
