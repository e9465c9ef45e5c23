#![allow(dead_code)]

use std::path::Path;

use axum::Router;
use og_backend::config::AppConfig;
use og_backend::features::analytics::AnalyticsMode;
use og_backend::features::posts::load_post_index;
use og_backend::{AppState, build_router};

/// 字体指向仓库自带的 `resources/fonts`，文章目录指向 `dir/posts`
pub fn config_with_fonts(dir: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    for font in cfg.fonts.iter_mut() {
        font.source = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join(&font.source)
            .to_string_lossy()
            .into_owned();
    }
    cfg.content.posts_dir = dir.join("posts").to_string_lossy().into_owned();
    cfg.image.max_parallel = 2;
    cfg
}

pub fn write_post(dir: &Path, file: &str, front_matter: &str) {
    let posts = dir.join("posts");
    let path = posts.join(file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir posts");
    }
    std::fs::write(&path, format!("---\n{front_matter}\n---\n\nBody text.\n")).expect("write post");
}

pub fn build_app(cfg: &AppConfig) -> Router {
    let posts = load_post_index(&cfg.posts_path()).expect("post index");
    let state = AppState::new(cfg, posts);
    build_router(cfg, state, AnalyticsMode::Disabled)
}
