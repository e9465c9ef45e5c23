use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 分享卡片固定画布宽度（社交平台通用 1.91:1）
pub const CANVAS_WIDTH: u32 = 1200;
/// 分享卡片固定画布高度
pub const CANVAS_HEIGHT: u32 = 630;

/// 卡片的文字输入。缺失字段一律视为空串，不做校验。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct PageMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl PageMetadata {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn from_parts(title: Option<&str>, description: Option<&str>) -> Self {
        Self::new(title.unwrap_or_default(), description.unwrap_or_default())
    }
}

/// 字体样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    pub fn as_css(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        }
    }
}

/// 文本节点引用字体时使用的 (family, weight, style) 三元组
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontFace {
    pub family: String,
    pub weight: u16,
    #[serde(default)]
    pub style: FontStyle,
}

impl FontFace {
    pub fn new(family: impl Into<String>, weight: u16, style: FontStyle) -> Self {
        Self {
            family: family.into(),
            weight,
            style,
        }
    }
}

impl std::fmt::Display for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.family, self.weight, self.style.as_css())
    }
}

/// 已加载的字体二进制
#[derive(Debug, Clone)]
pub struct FontAsset {
    pub name: String,
    pub weight: u16,
    pub style: FontStyle,
    pub data: Bytes,
}

impl FontAsset {
    pub fn face(&self) -> FontFace {
        FontFace::new(self.name.clone(), self.weight, self.style)
    }

    pub fn matches(&self, face: &FontFace) -> bool {
        self.name == face.family && self.weight == face.weight && self.style == face.style
    }
}

/// 编码完成的 JPEG
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
}

impl RenderedImage {
    pub const CONTENT_TYPE: &'static str = "image/jpeg";

    /// 内容摘要（sha256 前 16 字节的 hex），相同输入得到相同摘要
    pub fn digest(&self) -> String {
        let hash = Sha256::digest(&self.bytes);
        hex::encode(&hash[..16])
    }

    /// 强 ETag 形式的摘要
    pub fn etag(&self) -> String {
        format!("\"{}\"", self.digest())
    }
}

/// 输出格式（JPEG 为默认，SVG 便于排查排版问题）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Svg,
}

impl OutputFormat {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            None => Some(OutputFormat::Jpeg),
            Some(s) if s.is_empty() => Some(OutputFormat::Jpeg),
            Some(s) => match s.as_str() {
                "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
                "svg" => Some(OutputFormat::Svg),
                _ => None,
            },
        }
    }
}
