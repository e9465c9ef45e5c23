use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

use crate::error::{AppError, ProblemDetails};
use crate::features::health::HealthResponse;
use crate::features::og::PageMetadata;
use crate::features::posts::PostRecord;
use crate::features::posts::models::PostListResponse;

/// Swagger UI 的 Servers 配置。
///
/// - 卡片、RSS 与 `/health` 挂在根路径；
/// - JSON 接口挂在 `config.api.prefix`（默认 /api）下。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（/og.jpg、/rss.xml、/health）"))
            .build();

        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("JSON 接口（默认 /api）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api")
                    .description(Some("对应 config.api.prefix（可通过 APP_API__PREFIX 覆盖）")),
            )
            .build();

        openapi.servers = Some(vec![root, api]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::og::handler::site_card,
        crate::features::og::handler::post_card,
        crate::features::posts::handler::list_posts,
        crate::features::posts::handler::rss_feed,
    ),
    components(schemas(
        AppError,
        ProblemDetails,
        HealthResponse,
        PageMetadata,
        PostRecord,
        PostListResponse,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "OpenGraph",
            description = "分享卡片：1200x630 JPEG，带长效缓存头。"
        ),
        (name = "Posts", description = "文章索引：JSON 列表与 RSS。"),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "OG Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "站点后端（Axum + utoipa）。`/posts` 实际挂载在 `config.api.prefix` 下，其余路径位于根路径。"
    )
)]
pub struct ApiDoc;
