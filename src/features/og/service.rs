use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::error::AppError;

use super::fonts::FontLoader;
use super::raster::{RasterOptions, encode_jpeg_async};
use super::template::{CardStyle, build_card};
use super::types::{CANVAS_HEIGHT, CANVAS_WIDTH, PageMetadata, RenderedImage};
use super::vector::{VectorImage, render_svg};

/// 分享卡片渲染服务：字体 → 模板 → 矢量 → JPEG
#[derive(Clone)]
pub struct OgService {
    fonts: FontLoader,
    style: Arc<CardStyle>,
    raster: RasterOptions,
    /// 控制并发栅格化的信号量（限制 CPU 密集型任务数量）
    render_semaphore: Arc<Semaphore>,
}

impl OgService {
    pub fn new(
        fonts: FontLoader,
        style: CardStyle,
        raster: RasterOptions,
        max_parallel: usize,
    ) -> Self {
        Self {
            fonts,
            style: Arc::new(style),
            raster,
            render_semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let loader = FontLoader::new(
            &cfg.fonts,
            cfg.image.font_cache_enabled,
            Duration::from_secs(cfg.image.font_timeout_secs),
        );
        let raster = RasterOptions {
            quality: cfg.image.quality,
            optimize_speed: cfg.image.optimize_speed,
            ..RasterOptions::default()
        };
        Self::new(
            loader,
            cfg.template.clone(),
            raster,
            cfg.image.effective_parallelism(),
        )
    }

    pub fn fonts(&self) -> &FontLoader {
        &self.fonts
    }

    /// 预先加载一次字体；启用缓存时可消除首个请求的下载延迟
    pub async fn prewarm(&self) -> Result<usize, AppError> {
        Ok(self.fonts.load_all().await?.len())
    }

    async fn build_vector(
        &self,
        meta: &PageMetadata,
    ) -> Result<(VectorImage, Vec<super::types::FontAsset>), AppError> {
        let fonts = self.fonts.load_all().await?;
        let tree = build_card(meta, &self.style);
        let vector = render_svg(&tree, CANVAS_WIDTH, CANVAS_HEIGHT, &fonts)?;
        Ok((vector, fonts))
    }

    /// 渲染 JPEG 卡片
    pub async fn render(&self, meta: &PageMetadata) -> Result<RenderedImage, AppError> {
        let t_total = Instant::now();
        let (vector, fonts) = self.build_vector(meta).await?;
        let t_vector = t_total.elapsed();

        let permits_avail = self.render_semaphore.available_permits();
        let t_wait = Instant::now();
        let _permit = self
            .render_semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("获取渲染信号量失败: {e}")))?;
        let wait = t_wait.elapsed();

        let t_encode = Instant::now();
        let bytes = encode_jpeg_async(vector, fonts, self.raster.clone()).await?;
        let encode = t_encode.elapsed();

        tracing::info!(
            target: "og_performance",
            "卡片渲染完成: 矢量={:?}, 可用许可={}, 等待={:?}, 栅格化+编码={:?}, 总计={:?}, 大小={}B",
            t_vector,
            permits_avail,
            wait,
            encode,
            t_total.elapsed(),
            bytes.len()
        );

        Ok(RenderedImage {
            bytes: Bytes::from(bytes),
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        })
    }

    /// 渲染内嵌字体的 SVG 文本（不经过栅格化）
    pub async fn render_svg(&self, meta: &PageMetadata) -> Result<String, AppError> {
        let (vector, _) = self.build_vector(meta).await?;
        Ok(vector.to_svg(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::og::test_fonts::bundled_font_configs;

    fn service() -> OgService {
        let mut cfg = AppConfig::default();
        cfg.fonts = bundled_font_configs();
        cfg.image.max_parallel = 2;
        OgService::from_config(&cfg)
    }

    #[tokio::test]
    async fn renders_fixed_canvas_jpeg() {
        let svc = service();
        let img = svc
            .render(&PageMetadata::new("Steve Kinney", "Personal site and course notes"))
            .await
            .expect("render");
        assert_eq!((img.width, img.height), (CANVAS_WIDTH, CANVAS_HEIGHT));
        let decoded = image::load_from_memory(&img.bytes).expect("decode");
        assert_eq!(decoded.width(), 1200);
        assert_eq!(decoded.height(), 630);
    }

    #[tokio::test]
    async fn repeated_renders_share_digest() {
        let svc = service();
        let meta = PageMetadata::new("Same", "Input");
        let a = svc.render(&meta).await.expect("a");
        let b = svc.render(&meta).await.expect("b");
        assert_eq!(a.digest(), b.digest());
    }

    #[tokio::test]
    async fn svg_output_embeds_fonts() {
        let svc = service();
        let svg = svc
            .render_svg(&PageMetadata::new("Hello", "World"))
            .await
            .expect("svg");
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("@font-face"));
        assert!(svg.contains("Hello"));
    }

    #[tokio::test]
    async fn missing_font_fails_render() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut cfg = AppConfig::default();
        cfg.fonts = bundled_font_configs();
        cfg.fonts[1].source = dir.path().join("nope.ttf").to_string_lossy().into_owned();
        let svc = OgService::from_config(&cfg);
        let err = svc
            .render(&PageMetadata::default())
            .await
            .expect_err("should fail");
        assert!(matches!(err, AppError::FontFetch(_)));
    }

    #[tokio::test]
    async fn title_changes_the_rendered_card() {
        let svc = service();
        let titled = svc
            .render(&PageMetadata::new("Steve Kinney", "Personal site and course notes"))
            .await
            .expect("titled");
        let empty = svc.render(&PageMetadata::default()).await.expect("empty");
        assert_ne!(titled.bytes, empty.bytes);
    }

    #[tokio::test]
    async fn unusable_font_data_fails_render() {
        let dir = tempfile::tempdir().expect("tempdir");
        let garbage = dir.path().join("garbage.ttf");
        std::fs::write(&garbage, b"not a font at all").expect("write");

        let mut cfg = AppConfig::default();
        cfg.fonts = bundled_font_configs();
        cfg.fonts[2].source = garbage.to_string_lossy().into_owned();
        let svc = OgService::from_config(&cfg);
        let err = svc
            .render(&PageMetadata::new("Title", "Description"))
            .await
            .expect_err("should fail");
        assert!(matches!(err, AppError::Render(_)), "{err:?}");
    }
}
