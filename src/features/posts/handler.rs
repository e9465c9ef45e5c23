use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{error::AppError, state::AppState};

use super::feed::{RSS_CONTENT_TYPE, render_rss};
use super::models::PostListResponse;

/// Feed 的缓存时间短于卡片：新文章需要较快出现
const FEED_CACHE_CONTROL: &str = "public, max-age=3600";

#[utoipa::path(
    get,
    path = "/posts",
    summary = "文章列表",
    description = "返回已发布文章的元信息（日期倒序，同日按 slug 升序）。",
    responses(
        (status = 200, description = "文章列表", body = PostListResponse)
    ),
    tag = "Posts"
)]
pub async fn list_posts(State(state): State<AppState>) -> Json<PostListResponse> {
    let items = state.posts.as_slice().to_vec();
    Json(PostListResponse {
        total: items.len(),
        items,
    })
}

#[utoipa::path(
    get,
    path = "/rss.xml",
    summary = "RSS 订阅",
    description = "由文章索引与站点配置生成的 RSS 2.0 文档。",
    responses(
        (status = 200, description = "RSS 2.0 XML", content_type = "application/rss+xml"),
        (status = 500, description = "模板渲染失败", body = AppError)
    ),
    tag = "Posts"
)]
pub async fn rss_feed(State(state): State<AppState>) -> Result<Response, AppError> {
    let xml = render_rss(&state.site, &state.posts)?;
    Ok((
        [
            (header::CONTENT_TYPE, RSS_CONTENT_TYPE),
            (header::CACHE_CONTROL, FEED_CACHE_CONTROL),
        ],
        xml,
    )
        .into_response())
}

/// JSON 接口，挂载在 `api.prefix` 之下
pub fn create_posts_router() -> Router<AppState> {
    Router::new().route("/posts", get(list_posts))
}

/// 根路径下的 Feed
pub fn create_feed_router() -> Router<AppState> {
    Router::new().route("/rss.xml", get(rss_feed))
}
