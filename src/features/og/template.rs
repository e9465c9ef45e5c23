//! 分享卡片布局模板。
//!
//! 只负责描述“画什么”：盒子、文字、字体与颜色，不涉及像素。
//! 给定相同的 `PageMetadata` 与 `CardStyle`，输出的树完全一致。

use serde::{Deserialize, Serialize};

use super::types::{CANVAS_HEIGHT, CANVAS_WIDTH, FontFace, FontStyle, PageMetadata};

/// 抽象视觉树
#[derive(Debug, Clone, PartialEq)]
pub struct VisualTree {
    pub root: BoxNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Box(BoxNode),
    Text(TextNode),
}

/// 填充方式
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(String),
    /// 自左上到右下的线性渐变
    LinearGradient { from: String, to: String },
}

/// 容器：子节点在 padding 内自上而下排列，相邻之间留 `gap`
#[derive(Debug, Clone, PartialEq)]
pub struct BoxNode {
    pub width: f32,
    /// `None` 表示高度由内容决定
    pub height: Option<f32>,
    pub padding: f32,
    pub gap: f32,
    pub background: Option<Paint>,
    pub corner_radius: f32,
    pub children: Vec<Node>,
}

impl BoxNode {
    fn new(width: f32, height: Option<f32>) -> Self {
        Self {
            width,
            height,
            padding: 0.0,
            gap: 0.0,
            background: None,
            corner_radius: 0.0,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub content: String,
    pub face: FontFace,
    pub size: f32,
    /// 行高（倍数）
    pub line_height: f32,
    pub color: String,
    pub max_lines: usize,
}

impl VisualTree {
    /// 深度优先收集所有文本节点引用的字体（去重，保持首次出现顺序）
    pub fn faces(&self) -> Vec<FontFace> {
        fn walk(node: &BoxNode, out: &mut Vec<FontFace>) {
            for child in &node.children {
                match child {
                    Node::Box(b) => walk(b, out),
                    Node::Text(t) => {
                        if !out.contains(&t.face) {
                            out.push(t.face.clone());
                        }
                    }
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &mut out);
        out
    }
}

/// 卡片品牌样式（可由配置 `[template]` 覆盖，未填写的字段取默认值）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CardStyle {
    pub background_start: String,
    pub background_end: String,
    pub accent: String,
    pub title_color: String,
    pub description_color: String,
    pub label_color: String,
    /// 标题上方的小字（如站点域名），为空则不渲染
    pub label: String,
    pub padding: f32,
    pub gap: f32,
    pub display_family: String,
    pub display_weight: u16,
    pub body_family: String,
    pub body_weight: u16,
    pub body_bold_weight: u16,
    pub title_size: f32,
    pub description_size: f32,
    pub label_size: f32,
    pub title_max_lines: usize,
    pub description_max_lines: usize,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            background_start: "#0f172a".to_string(),
            background_end: "#1e293b".to_string(),
            accent: "#f59e0b".to_string(),
            title_color: "#f8fafc".to_string(),
            description_color: "#cbd5e1".to_string(),
            label_color: "#fbbf24".to_string(),
            label: "stevekinney.com".to_string(),
            padding: 80.0,
            gap: 28.0,
            display_family: "DejaVu Serif".to_string(),
            display_weight: 700,
            body_family: "DejaVu Sans".to_string(),
            body_weight: 400,
            body_bold_weight: 700,
            title_size: 72.0,
            description_size: 34.0,
            label_size: 26.0,
            title_max_lines: 3,
            description_max_lines: 3,
        }
    }
}

impl CardStyle {
    pub fn display_face(&self) -> FontFace {
        FontFace::new(&self.display_family, self.display_weight, FontStyle::Normal)
    }

    pub fn body_face(&self) -> FontFace {
        FontFace::new(&self.body_family, self.body_weight, FontStyle::Normal)
    }

    pub fn body_bold_face(&self) -> FontFace {
        FontFace::new(&self.body_family, self.body_bold_weight, FontStyle::Normal)
    }
}

/// 生成分享卡片的视觉树。
///
/// 空标题/空描述仍会生成对应文本节点（内容为空），版式保持不变。
pub fn build_card(meta: &PageMetadata, style: &CardStyle) -> VisualTree {
    let width = CANVAS_WIDTH as f32;
    let height = CANVAS_HEIGHT as f32;

    let mut root = BoxNode::new(width, Some(height));
    root.padding = style.padding;
    root.gap = style.gap;
    root.background = Some(Paint::LinearGradient {
        from: style.background_start.clone(),
        to: style.background_end.clone(),
    });

    let mut accent = BoxNode::new(120.0, Some(8.0));
    accent.background = Some(Paint::Solid(style.accent.clone()));
    accent.corner_radius = 4.0;
    root.children.push(Node::Box(accent));

    if !style.label.trim().is_empty() {
        root.children.push(Node::Text(TextNode {
            content: style.label.trim().to_string(),
            face: style.body_bold_face(),
            size: style.label_size,
            line_height: 1.2,
            color: style.label_color.clone(),
            max_lines: 1,
        }));
    }

    root.children.push(Node::Text(TextNode {
        content: normalize_whitespace(&meta.title),
        face: style.display_face(),
        size: style.title_size,
        line_height: 1.1,
        color: style.title_color.clone(),
        max_lines: style.title_max_lines.max(1),
    }));

    root.children.push(Node::Text(TextNode {
        content: normalize_whitespace(&meta.description),
        face: style.body_face(),
        size: style.description_size,
        line_height: 1.4,
        color: style.description_color.clone(),
        max_lines: style.description_max_lines.max(1),
    }));

    VisualTree { root }
}

/// 折叠连续空白（含换行），卡片上不保留原文排版
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
