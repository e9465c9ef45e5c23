use axum::{
    Router,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{error::AppError, state::AppState};

use super::types::{OutputFormat, PageMetadata, RenderedImage};

/// 分享卡片的缓存策略：一周新鲜期 + 一天后台重新验证
pub const OG_CACHE_CONTROL: &str = "public, max-age=604800, stale-while-revalidate=86400";
const SVG_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";

/// 输出选项（通过 Query 传入）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OgQueryOpts {
    /// 输出格式：jpeg（默认）或 svg
    #[serde(default)]
    format: Option<String>,
}

impl OgQueryOpts {
    fn output_format(&self) -> Result<OutputFormat, AppError> {
        OutputFormat::parse(self.format.as_deref()).ok_or_else(|| {
            AppError::Validation(format!(
                "不支持的输出格式 `{}`，可选值: jpeg, svg",
                self.format.as_deref().unwrap_or_default()
            ))
        })
    }
}

/// 组装 JPEG 响应；头部集合固定，ETag 仅在配置开启时附带
pub fn jpeg_response(image: RenderedImage, emit_etag: bool) -> Response {
    let etag = emit_etag.then(|| image.etag());
    let len = image.bytes.len();
    let mut resp = Response::new(Body::from(image.bytes));
    *resp.status_mut() = StatusCode::OK;
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(RenderedImage::CONTENT_TYPE),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(OG_CACHE_CONTROL),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    if let Some(tag) = etag
        && let Ok(v) = HeaderValue::from_str(&tag)
    {
        headers.insert(header::ETAG, v);
    }
    resp
}

fn svg_response(svg: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, SVG_CONTENT_TYPE),
            (header::CACHE_CONTROL, OG_CACHE_CONTROL),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        svg,
    )
        .into_response()
}

async fn render_card(
    state: &AppState,
    meta: &PageMetadata,
    format: OutputFormat,
) -> Result<Response, AppError> {
    match format {
        OutputFormat::Jpeg => {
            let image = state.og.render(meta).await?;
            Ok(jpeg_response(image, state.emit_etag))
        }
        OutputFormat::Svg => Ok(svg_response(state.og.render_svg(meta).await?)),
    }
}

#[utoipa::path(
    get,
    path = "/og.jpg",
    summary = "站点默认分享卡片",
    description = "以站点标题与描述渲染 1200x630 的 JPEG 分享卡片。相同配置下输出逐字节一致。",
    params(
        ("format" = Option<String>, Query, description = "输出格式：jpeg|svg，默认 jpeg（svg 内嵌字体，便于排查排版）")
    ),
    responses(
        (status = 200, description = "image/jpeg 卡片", content_type = "image/jpeg"),
        (status = 422, description = "不支持的输出格式", body = AppError),
        (status = 500, description = "字体获取或渲染失败", body = AppError)
    ),
    tag = "OpenGraph"
)]
pub async fn site_card(
    State(state): State<AppState>,
    Query(q): Query<OgQueryOpts>,
) -> Result<Response, AppError> {
    let format = q.output_format()?;
    let meta = PageMetadata::new(state.site.title.clone(), state.site.description.clone());
    render_card(&state, &meta, format).await
}

#[utoipa::path(
    get,
    path = "/og/posts/{slug}",
    summary = "文章分享卡片",
    description = "以文章 front matter 中的标题与描述渲染分享卡片。",
    params(
        ("slug" = String, Path, description = "文章 slug"),
        ("format" = Option<String>, Query, description = "输出格式：jpeg|svg，默认 jpeg")
    ),
    responses(
        (status = 200, description = "image/jpeg 卡片", content_type = "image/jpeg"),
        (status = 404, description = "文章不存在", body = AppError),
        (status = 422, description = "不支持的输出格式", body = AppError),
        (status = 500, description = "字体获取或渲染失败", body = AppError)
    ),
    tag = "OpenGraph"
)]
pub async fn post_card(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(q): Query<OgQueryOpts>,
) -> Result<Response, AppError> {
    let format = q.output_format()?;
    let post = state
        .posts
        .get(&slug)
        .ok_or_else(|| AppError::NotFound(format!("文章 `{slug}` 不存在")))?;
    render_card(&state, &post.metadata(), format).await
}

pub fn create_og_router() -> Router<AppState> {
    Router::new()
        .route("/og.jpg", get(site_card))
        .route("/og/posts/:slug", get(post_card))
}
