use std::sync::Arc;

use crate::config::{AppConfig, SiteConfig};
use crate::features::og::OgService;
use crate::features::posts::PostIndex;

/// 聚合的应用共享状态（请求之间只读）
#[derive(Clone)]
pub struct AppState {
    pub site: Arc<SiteConfig>,
    pub og: OgService,
    pub posts: Arc<PostIndex>,
    /// 是否为卡片响应附带 ETag
    pub emit_etag: bool,
}

impl AppState {
    pub fn new(config: &AppConfig, posts: PostIndex) -> Self {
        Self {
            site: Arc::new(config.site.clone()),
            og: OgService::from_config(config),
            posts: Arc::new(posts),
            emit_etag: config.image.emit_etag,
        }
    }
}
