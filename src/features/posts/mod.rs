//! 文章索引：front matter 扫描、JSON 列表与 RSS。

pub mod feed;
pub mod handler;
mod loader;
pub mod models;

pub use feed::render_rss;
pub use handler::{create_feed_router, create_posts_router};
pub use loader::load_post_index;
pub use models::{PostIndex, PostRecord};
