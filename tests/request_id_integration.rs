use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    routing::get,
};
use tower::ServiceExt;

use og_backend::AppError;
use og_backend::request_id::request_id_middleware;

async fn fail_handler() -> Result<&'static str, AppError> {
    Err(AppError::FontFetch("https://fonts.example.com/a.ttf 返回 404".into()))
}

fn build_app() -> Router {
    Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/fail", get(fail_handler))
        .layer(axum::middleware::from_fn(request_id_middleware))
}

fn header_id(resp: &axum::response::Response) -> String {
    resp.headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

#[tokio::test]
async fn request_id_is_generated_when_missing_or_invalid() {
    for supplied in [None, Some("bad id with spaces")] {
        let mut req = Request::builder().uri("/ok");
        if let Some(v) = supplied {
            req = req.header("x-request-id", v);
        }
        let resp = build_app()
            .oneshot(req.body(Body::empty()).expect("request"))
            .await
            .expect("request /ok");
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(header_id(&resp).starts_with("og_"));
    }
}

#[tokio::test]
async fn client_request_id_is_echoed() {
    let resp = build_app()
        .oneshot(
            Request::builder()
                .uri("/ok")
                .header("x-request-id", "client.req-001")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("request /ok");
    assert_eq!(header_id(&resp), "client.req-001");
}

#[tokio::test]
async fn problem_details_carry_request_id() {
    let resp = build_app()
        .oneshot(
            Request::builder()
                .uri("/fail")
                .header("x-request-id", "err.req-001")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("request /fail");

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.headers()["content-type"],
        "application/problem+json"
    );
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("parse json");
    assert_eq!(json["requestId"], "err.req-001");
    assert_eq!(json["code"], "FONT_FETCH_FAILED");
    assert_eq!(json["status"], 500);
}
