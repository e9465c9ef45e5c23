//! Open Graph 分享卡片：布局模板 → 矢量渲染 → JPEG 编码 → HTTP 交付。

mod fonts;
pub mod handler;
mod raster;
mod service;
mod template;
#[cfg(test)]
pub(crate) mod test_fonts;
mod types;
mod vector;

pub use fonts::{FontLoader, FontSource};
pub use handler::{OG_CACHE_CONTROL, create_og_router, jpeg_response};
pub use raster::{RasterOptions, encode_jpeg, encode_jpeg_async};
pub use service::OgService;
pub use template::{BoxNode, CardStyle, Node, Paint, TextNode, VisualTree, build_card};
pub use types::{
    CANVAS_HEIGHT, CANVAS_WIDTH, FontAsset, FontFace, FontStyle, OutputFormat, PageMetadata,
    RenderedImage,
};
pub use vector::{VectorImage, render_svg};
