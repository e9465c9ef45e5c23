//! 矢量渲染：把视觉树排版成固定画布的 SVG，并校验字体三元组。

use std::fmt::Write;

use base64::{Engine as _, engine::general_purpose::STANDARD as base64_engine};
use unicode_width::UnicodeWidthChar;

use crate::error::AppError;

use super::template::{BoxNode, Node, Paint, TextNode, VisualTree};
use super::types::FontAsset;

/// 基线相对字号的位置（近似 ascent）
const ASCENT_RATIO: f32 = 0.8;
const ELLIPSIS: char = '…';

/// 矢量渲染结果：SVG 正文 + 其引用到的字体
#[derive(Debug, Clone)]
pub struct VectorImage {
    pub width: u32,
    pub height: u32,
    defs: String,
    body: String,
    fonts: Vec<FontAsset>,
}

impl VectorImage {
    /// 本图引用到的字体（顺序与视觉树中首次出现的顺序一致）
    pub fn fonts(&self) -> &[FontAsset] {
        &self.fonts
    }

    /// 生成完整 SVG。
    ///
    /// `embed_fonts = true` 时以 base64 `@font-face` 内嵌字体，供浏览器直接查看；
    /// 栅格化时字体由 fontdb 提供，无需内嵌。
    pub fn to_svg(&self, embed_fonts: bool) -> String {
        let mut svg = String::with_capacity(self.defs.len() + self.body.len() + 256);
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        svg.push_str("<defs>");
        if embed_fonts && !self.fonts.is_empty() {
            svg.push_str("<style>");
            for font in &self.fonts {
                let (mime, format) = sniff_font_format(&font.data);
                let _ = write!(
                    svg,
                    "@font-face{{font-family:'{family}';font-weight:{weight};font-style:{style};src:url(data:{mime};base64,{data}) format('{format}');}}",
                    family = css_family(&font.name),
                    weight = font.weight,
                    style = font.style.as_css(),
                    data = base64_engine.encode(&font.data),
                );
            }
            svg.push_str("</style>");
        }
        svg.push_str(&self.defs);
        svg.push_str("</defs>");
        svg.push_str(&self.body);
        svg.push_str("</svg>");
        svg
    }
}

/// 将视觉树渲染为固定画布的 SVG。
///
/// 文本节点引用的每个 (family, weight, style) 都必须在 `fonts` 中存在，
/// 否则返回错误而不是静默回退到其他字体。
pub fn render_svg(
    tree: &VisualTree,
    width: u32,
    height: u32,
    fonts: &[FontAsset],
) -> Result<VectorImage, AppError> {
    if width == 0 || height == 0 {
        return Err(AppError::Render(format!(
            "画布尺寸无效: {width}x{height}"
        )));
    }

    let mut used = Vec::new();
    for face in tree.faces() {
        let asset = fonts.iter().find(|a| a.matches(&face)).ok_or_else(|| {
            AppError::Render(format!("缺少字体 `{face}`，拒绝回退到未声明的字体"))
        })?;
        used.push(asset.clone());
    }

    let mut ctx = SvgContext::default();
    let mut body = String::new();
    emit_box(&tree.root, 0.0, 0.0, &mut ctx, &mut body);

    Ok(VectorImage {
        width,
        height,
        defs: ctx.defs,
        body,
        fonts: used,
    })
}

#[derive(Default)]
struct SvgContext {
    defs: String,
    gradients: usize,
}

impl SvgContext {
    fn paint(&mut self, paint: &Paint) -> String {
        match paint {
            Paint::Solid(color) => escape_xml(color),
            Paint::LinearGradient { from, to } => {
                let id = format!("g{}", self.gradients);
                self.gradients += 1;
                let _ = write!(
                    self.defs,
                    r#"<linearGradient id="{id}" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{from}"/><stop offset="1" stop-color="{to}"/></linearGradient>"#,
                    from = escape_xml(from),
                    to = escape_xml(to),
                );
                format!("url(#{id})")
            }
        }
    }
}

/// 输出盒子并返回其占用高度
fn emit_box(node: &BoxNode, x: f32, y: f32, ctx: &mut SvgContext, out: &mut String) -> f32 {
    let inner_x = x + node.padding;
    let inner_w = (node.width - node.padding * 2.0).max(0.0);

    let mut inner = String::new();
    let mut cursor = y + node.padding;
    for (i, child) in node.children.iter().enumerate() {
        if i > 0 {
            cursor += node.gap;
        }
        cursor += match child {
            Node::Box(b) => emit_box(b, inner_x, cursor, ctx, &mut inner),
            Node::Text(t) => emit_text(t, inner_x, cursor, inner_w, &mut inner),
        };
    }

    let height = node
        .height
        .unwrap_or(cursor - y + node.padding)
        .max(0.0);

    if let Some(paint) = &node.background {
        let fill = ctx.paint(paint);
        let _ = write!(
            out,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{height:.1}""#,
            w = node.width
        );
        if node.corner_radius > 0.0 {
            let _ = write!(out, r#" rx="{:.1}""#, node.corner_radius);
        }
        let _ = write!(out, r#" fill="{fill}"/>"#);
    }
    out.push_str(&inner);
    height
}

/// 输出文本块（逐行一个 `<text>`）并返回其占用高度
fn emit_text(node: &TextNode, x: f32, y: f32, max_width: f32, out: &mut String) -> f32 {
    let lines = wrap_text(&node.content, node.size, max_width, node.max_lines);
    let line_height = node.size * node.line_height;
    for (i, line) in lines.iter().enumerate() {
        let baseline =
            y + i as f32 * line_height + (line_height - node.size) / 2.0 + node.size * ASCENT_RATIO;
        let _ = write!(
            out,
            r#"<text x="{x:.1}" y="{baseline:.1}" font-family="'{family}'" font-weight="{weight}" font-style="{style}" font-size="{size:.1}" fill="{fill}">{text}</text>"#,
            family = css_family(&node.face.family),
            weight = node.face.weight,
            style = node.face.style.as_css(),
            size = node.size,
            fill = escape_xml(&node.color),
            text = escape_xml(line),
        );
    }
    lines.len() as f32 * line_height
}

/// 单字符的近似步进宽度（相对字号）
fn char_advance(ch: char) -> f32 {
    match UnicodeWidthChar::width(ch) {
        Some(0) => 0.0,
        Some(2) => 1.0,
        _ => match ch {
            ' ' => 0.28,
            'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
            'm' | 'w' | 'M' | 'W' => 0.86,
            'A'..='Z' => 0.66,
            '0'..='9' => 0.58,
            _ => 0.54,
        },
    }
}

pub(super) fn measure(text: &str, size: f32) -> f32 {
    text.chars().map(char_advance).sum::<f32>() * size
}

/// 按空白贪心折行；单词超宽时按字符断开；超过 `max_lines` 时末行以省略号截断
pub(super) fn wrap_text(text: &str, size: f32, max_width: f32, max_lines: usize) -> Vec<String> {
    if max_lines == 0 || text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::<String>::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure(word, size) <= max_width {
            current = word.to_string();
            continue;
        }
        for ch in word.chars() {
            current.push(ch);
            if measure(&current, size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.pop() {
            lines.push(ellipsize(&last, size, max_width));
        }
    }
    lines
}

fn ellipsize(line: &str, size: f32, max_width: f32) -> String {
    let mut acc: String = line.trim_end().to_string();
    loop {
        let candidate = format!("{acc}{ELLIPSIS}");
        if acc.is_empty() || measure(&candidate, size) <= max_width {
            return candidate;
        }
        acc.pop();
        acc.truncate(acc.trim_end().len());
    }
}

fn sniff_font_format(data: &[u8]) -> (&'static str, &'static str) {
    match data.get(0..4) {
        Some(b"wOF2") => ("font/woff2", "woff2"),
        Some(b"wOFF") => ("font/woff", "woff"),
        Some(b"OTTO") => ("font/otf", "opentype"),
        _ => ("font/ttf", "truetype"),
    }
}

/// family 名称放在单引号内，去掉会破坏引号的字符
fn css_family(name: &str) -> String {
    escape_xml(&name.replace(['\'', '"', ';', '{', '}'], ""))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
