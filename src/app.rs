use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::cors::build_cors_layer;
use crate::features::analytics::{self, AnalyticsMode, AnalyticsState};
use crate::features::health::health_check;
use crate::features::og::create_og_router;
use crate::features::posts::{create_feed_router, create_posts_router};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 压缩策略：文本类响应（JSON/XML/SVG）压缩，JPEG 等位图从不压缩。
pub fn compression_predicate() -> impl tower_http::compression::predicate::Predicate {
    use tower_http::compression::predicate::{NotForContentType, Predicate, SizeAbove};

    SizeAbove::default()
        .and(NotForContentType::GRPC)
        .and(NotForContentType::IMAGES)
        .and(NotForContentType::SSE)
        .and(NotForContentType::const_new("application/octet-stream"))
}

/// 组装完整路由。
///
/// CORS 层只包住 Feed 与 JSON 接口；卡片端点自行写入
/// `Access-Control-Allow-Origin: *`，不能被配置的 Origin 覆盖。
pub fn build_router(config: &AppConfig, state: AppState, analytics: AnalyticsMode) -> Router {
    let mut public = Router::<AppState>::new()
        .merge(create_feed_router())
        .nest(&config.api.prefix, create_posts_router());
    if let Some(cors) = build_cors_layer(&config.cors) {
        public = public.layer(cors);
    }

    Router::<AppState>::new()
        .route("/health", get(health_check))
        .merge(create_og_router())
        .merge(public)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(axum::middleware::from_fn_with_state(
            AnalyticsState::new(analytics, config.analytics.ip_salt.as_deref()),
            analytics::analytics_middleware,
        ))
        .layer(CompressionLayer::new().compress_when(compression_predicate()))
        .layer(axum::middleware::from_fn(request_id_middleware))
}
