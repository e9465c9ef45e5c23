mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    routing::get,
};
use tower::ServiceExt;

use common::{build_app, config_with_fonts, write_post};

const CACHE_CONTROL: &str = "public, max-age=604800, stale-while-revalidate=86400";

async fn get_path(app: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    (status, headers, body.to_vec())
}

fn assert_card(headers: &axum::http::HeaderMap, body: &[u8]) {
    assert_eq!(headers[header::CONTENT_TYPE], "image/jpeg");
    assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let len: usize = headers[header::CONTENT_LENGTH]
        .to_str()
        .expect("ascii")
        .parse()
        .expect("number");
    assert!(len > 0);
    assert_eq!(len, body.len());

    let decoded = image::load_from_memory_with_format(body, image::ImageFormat::Jpeg)
        .expect("decode jpeg");
    assert_eq!((decoded.width(), decoded.height()), (1200, 630));
}

#[tokio::test]
async fn site_card_has_exact_headers_and_canvas() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.site.title = "Steve Kinney".to_string();
    cfg.site.description = "Personal site and course notes".to_string();

    let (status, headers, body) = get_path(build_app(&cfg), "/og.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_card(&headers, &body);
    assert!(headers.get(header::ETAG).is_none());
}

#[tokio::test]
async fn identical_requests_return_identical_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config_with_fonts(dir.path());
    let app = build_app(&cfg);

    let (_, _, first) = get_path(app.clone(), "/og.jpg").await;
    let (_, _, second) = get_path(app, "/og.jpg").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_metadata_still_renders() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.site.title = String::new();
    cfg.site.description = String::new();

    let (status, headers, body) = get_path(build_app(&cfg), "/og.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_card(&headers, &body);
}

#[tokio::test]
async fn very_long_title_keeps_canvas_size() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.site.title = "word ".repeat(400);

    let (status, headers, body) = get_path(build_app(&cfg), "/og.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_card(&headers, &body);
}

#[tokio::test]
async fn titled_card_differs_from_empty_card() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.site.title = "Steve Kinney".to_string();
    cfg.site.description = "Personal site and course notes".to_string();
    let (_, _, titled) = get_path(build_app(&cfg), "/og.jpg").await;

    cfg.site.title = String::new();
    cfg.site.description = String::new();
    let (_, _, empty) = get_path(build_app(&cfg), "/og.jpg").await;

    assert!(!titled.is_empty() && !empty.is_empty());
    assert_ne!(titled, empty);
}

async fn assert_render_failure(cfg: &og_backend::AppConfig) {
    let (status, headers, body) = get_path(build_app(cfg), "/og.jpg").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CONTENT_TYPE], "application/problem+json");
    let problem: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(problem["code"], "IMAGE_RENDER_FAILED");
}

#[tokio::test]
async fn unparseable_font_fails_with_render_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let garbage = dir.path().join("garbage.ttf");
    std::fs::write(&garbage, b"definitely not a font").expect("write");

    let mut cfg = config_with_fonts(dir.path());
    cfg.fonts[2].source = garbage.to_string_lossy().into_owned();
    assert_render_failure(&cfg).await;
}

#[tokio::test]
async fn misnamed_font_fails_with_render_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    // 文件是 DejaVu Serif，配置与模板却都声称是 Fraunces
    cfg.fonts[2].name = "Fraunces".to_string();
    cfg.template.display_family = "Fraunces".to_string();
    assert_render_failure(&cfg).await;
}

#[tokio::test]
async fn etag_is_emitted_when_enabled() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.image.emit_etag = true;
    let app = build_app(&cfg);

    let (_, h1, _) = get_path(app.clone(), "/og.jpg").await;
    let (_, h2, _) = get_path(app, "/og.jpg").await;
    let etag = h1[header::ETAG].to_str().expect("ascii");
    assert!(etag.starts_with('"') && etag.ends_with('"'));
    assert_eq!(h1[header::ETAG], h2[header::ETAG]);
}

#[tokio::test]
async fn post_card_and_unknown_slug() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_post(
        dir.path(),
        "hello-world.md",
        "title: Hello World\ndescription: First post\ndate: 2024-03-01",
    );
    let cfg = config_with_fonts(dir.path());
    let app = build_app(&cfg);

    let (status, headers, body) = get_path(app.clone(), "/og/posts/hello-world").await;
    assert_eq!(status, StatusCode::OK);
    assert_card(&headers, &body);

    let (status, headers, body) = get_path(app, "/og/posts/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(headers[header::CONTENT_TYPE], "application/problem+json");
    let problem: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(problem["code"], "NOT_FOUND");
    assert_eq!(problem["status"], 404);
}

#[tokio::test]
async fn svg_format_embeds_fonts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.site.title = "Fish & Chips".to_string();

    let (status, headers, body) = get_path(build_app(&cfg), "/og.jpg?format=svg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], CACHE_CONTROL);
    let svg = String::from_utf8(body).expect("utf8");
    assert!(svg.contains(r#"width="1200""#));
    assert!(svg.contains("@font-face"));
    assert!(svg.contains("Fish &amp; Chips"));
}

#[tokio::test]
async fn unsupported_format_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config_with_fonts(dir.path());
    let (status, headers, _) = get_path(build_app(&cfg), "/og.jpg?format=gif").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(headers[header::CONTENT_TYPE], "application/problem+json");
}

#[tokio::test]
async fn missing_remote_font_fails_the_request() {
    // 本地字体服务：只提供一个字体，其余路径返回 404
    let font_server =
        Router::new().route("/DejaVuSans.ttf", get(|| async { &b"font"[..] }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, font_server).await;
    });

    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.fonts[0].source = format!("http://{addr}/DejaVuSans.ttf");
    cfg.fonts[1].source = format!("http://{addr}/DejaVuSans-Bold.ttf");

    let (status, headers, body) = get_path(build_app(&cfg), "/og.jpg").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(headers[header::CONTENT_TYPE], "application/problem+json");
    let problem: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(problem["code"], "FONT_FETCH_FAILED");
    assert!(problem["requestId"].as_str().is_some());
}

#[tokio::test]
async fn configured_cors_does_not_override_wildcard_on_cards() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = config_with_fonts(dir.path());
    cfg.cors.enabled = true;
    cfg.cors.allowed_origins = vec!["https://example.com".to_string()];

    let resp = build_app(&cfg)
        .oneshot(
            Request::builder()
                .uri("/og.jpg")
                .header(header::ORIGIN, "https://example.com")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn jpeg_is_not_compressed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = config_with_fonts(dir.path());
    let resp = build_app(&cfg)
        .oneshot(
            Request::builder()
                .uri("/og.jpg")
                .header(header::ACCEPT_ENCODING, "gzip, br")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert!(resp.headers().get(header::CONTENT_ENCODING).is_none());
    let len: usize = resp.headers()[header::CONTENT_LENGTH]
        .to_str()
        .expect("ascii")
        .parse()
        .expect("number");
    let body = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    assert_eq!(len, body.len());
}
