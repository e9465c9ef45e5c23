//! 单元测试共用：仓库自带的 DejaVu 字体（resources/fonts）。

use std::path::Path;

use axum::body::Bytes;

use crate::config::{FontSourceConfig, default_fonts};

use super::types::FontAsset;

/// 默认字体配置，来源改写为绝对路径，不依赖测试进程的工作目录
pub fn bundled_font_configs() -> Vec<FontSourceConfig> {
    default_fonts()
        .into_iter()
        .map(|mut f| {
            f.source = Path::new(env!("CARGO_MANIFEST_DIR"))
                .join(&f.source)
                .to_string_lossy()
                .into_owned();
            f
        })
        .collect()
}

pub fn bundled_font_assets() -> Vec<FontAsset> {
    bundled_font_configs()
        .into_iter()
        .map(|f| FontAsset {
            data: Bytes::from(std::fs::read(&f.source).expect("bundled font")),
            name: f.name,
            weight: f.weight,
            style: f.style,
        })
        .collect()
}
