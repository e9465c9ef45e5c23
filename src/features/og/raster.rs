use std::sync::Arc;

use image::ColorType;
use image::codecs::jpeg::JpegEncoder;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg::{self, Options as UsvgOptions, fontdb};
use tokio::task::spawn_blocking;

use crate::error::AppError;

use super::types::{FontAsset, FontStyle};
use super::vector::VectorImage;

/// 栅格化与 JPEG 编码参数
#[derive(Debug, Clone)]
pub struct RasterOptions {
    /// JPEG 质量 1-100
    pub quality: u8,
    /// 画布底色（JPEG 无透明通道）
    pub background: [u8; 3],
    pub optimize_speed: bool,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            quality: 85,
            background: [0x0f, 0x17, 0x2a],
            optimize_speed: false,
        }
    }
}

/// 仅由给定字体构建字体库：不加载系统字体，保证不同机器上的输出一致。
///
/// 每个字体都必须能被解析，并且能以配置的 (family, weight, style) 查询到
/// 同名字体；否则文本会被 usvg 静默丢弃，因此直接判定为渲染失败。
fn build_font_db(fonts: &[FontAsset]) -> Result<fontdb::Database, AppError> {
    let mut db = fontdb::Database::new();
    for font in fonts {
        let before = db.len();
        db.load_font_data(font.data.to_vec());
        if db.len() == before {
            return Err(AppError::Render(format!("字体数据无法解析: {}", font.face())));
        }
    }

    for font in fonts {
        let families = [fontdb::Family::Name(font.name.as_str())];
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(font.weight),
            style: match font.style {
                FontStyle::Normal => fontdb::Style::Normal,
                FontStyle::Italic => fontdb::Style::Italic,
            },
            ..Default::default()
        };
        let resolved = db
            .query(&query)
            .and_then(|id| db.face(id))
            .is_some_and(|face| face.families.iter().any(|(name, _)| *name == font.name));
        if !resolved {
            let available: Vec<String> = db
                .faces()
                .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
                .collect();
            return Err(AppError::Render(format!(
                "字体族名与字体文件不一致: {}（字体文件提供: {}）",
                font.face(),
                available.join(", ")
            )));
        }
    }
    Ok(db)
}

/// 将矢量图栅格化并编码为 JPEG
pub fn encode_jpeg(
    image: &VectorImage,
    fonts: &[FontAsset],
    opts: &RasterOptions,
) -> Result<Vec<u8>, AppError> {
    let t0 = std::time::Instant::now();

    let font_db = build_font_db(fonts)?;
    let speed = opts.optimize_speed;
    let usvg_opts = UsvgOptions {
        fontdb: Arc::new(font_db),
        languages: vec!["en".to_string()],
        shape_rendering: if speed {
            usvg::ShapeRendering::OptimizeSpeed
        } else {
            usvg::ShapeRendering::GeometricPrecision
        },
        text_rendering: if speed {
            usvg::TextRendering::OptimizeSpeed
        } else {
            usvg::TextRendering::OptimizeLegibility
        },
        image_rendering: if speed {
            usvg::ImageRendering::OptimizeSpeed
        } else {
            usvg::ImageRendering::OptimizeQuality
        },
        ..Default::default()
    };

    let svg = image.to_svg(false);
    let tree = usvg::Tree::from_data(svg.as_bytes(), &usvg_opts)
        .map_err(|e| AppError::Render(format!("Failed to parse SVG: {e}")))?;
    let t_parse = t0.elapsed();

    let size = tree.size().to_int_size();
    if size.width() != image.width || size.height() != image.height {
        return Err(AppError::Render(format!(
            "画布尺寸不一致: 期望 {}x{}，实际 {}x{}",
            image.width,
            image.height,
            size.width(),
            size.height()
        )));
    }

    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| AppError::Render("Failed to create pixmap".to_string()))?;
    let [r, g, b] = opts.background;
    pixmap.fill(Color::from_rgba8(r, g, b, 255));
    resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
    let t_raster = t0.elapsed();

    // 底色不透明，预乘 RGBA 与直通 RGB 等价，直接丢弃 alpha
    let rgb: Vec<u8> = pixmap
        .data()
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut out = Vec::new();
    let mut enc = JpegEncoder::new_with_quality(&mut out, opts.quality.clamp(1, 100));
    enc.encode(&rgb, size.width(), size.height(), ColorType::Rgb8.into())
        .map_err(|e| AppError::Render(format!("JPEG encode error: {e}")))?;
    let t_encode = t0.elapsed();

    tracing::debug!(
        "JPEG渲染内部分段: 解析={:?}, 栅格化={:?}, 编码={:?}, 大小={}B",
        t_parse,
        t_raster - t_parse,
        t_encode - t_raster,
        out.len()
    );

    Ok(out)
}

/// 异步版本：将解析、栅格化与编码放入 Tokio 阻塞线程池，避免阻塞异步运行时线程。
pub async fn encode_jpeg_async(
    image: VectorImage,
    fonts: Vec<FontAsset>,
    opts: RasterOptions,
) -> Result<Vec<u8>, AppError> {
    spawn_blocking(move || encode_jpeg(&image, &fonts, &opts))
        .await
        .map_err(|e| AppError::Internal(format!("阻塞渲染任务执行失败: {e}")))?
}
