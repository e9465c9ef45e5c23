use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{AnalyticsMode, AnalyticsState};

/// 访问事件中间件：每个请求输出一条 `analytics` 事件。
///
/// 客户端 IP 只以加盐 HMAC 形式出现，不写入原值；未配置盐时不记录客户端字段。
pub async fn analytics_middleware(
    State(state): State<AnalyticsState>,
    req: Request,
    next: Next,
) -> Response {
    let mode = state.mode;
    if !mode.is_enabled() {
        return next.run(req).await;
    }

    let started = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let client = client_field(&state, req.headers());
    let referer = req
        .headers()
        .get(axum::http::header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let res = next.run(req).await;
    let status = res.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;

    match mode {
        AnalyticsMode::Production => tracing::info!(
            target: "analytics",
            %method, %route, status, duration_ms, client = client.as_deref(), referer = referer.as_deref(),
            "page_view"
        ),
        _ => tracing::debug!(
            target: "analytics",
            %method, %route, status, duration_ms, client = client.as_deref(), referer = referer.as_deref(),
            "page_view"
        ),
    }

    res
}

/// HMAC-SHA256(salt, value) 的前 16 字节（hex）
pub fn hmac_hex16(salt: &str, value: &str) -> Option<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(salt.as_bytes()).ok()?;
    mac.update(value.as_bytes());
    let bytes = mac.finalize().into_bytes();
    Some(hex::encode(&bytes[..16]))
}

fn client_field(state: &AnalyticsState, headers: &HeaderMap) -> Option<String> {
    let salt = state.ip_salt()?;
    hmac_hex16(salt, client_ip_from_headers(headers)?)
}

fn client_ip_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next().map(|s| s.trim()))
        && !ip.is_empty()
    {
        return Some(ip);
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut h = HeaderMap::new();
        h.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 1.2.3.4 , 5.6.7.8 "),
        );
        h.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(client_ip_from_headers(&h), Some("1.2.3.4"));

        let mut h = HeaderMap::new();
        h.insert("x-forwarded-for", HeaderValue::from_static("  "));
        h.insert("x-real-ip", HeaderValue::from_static(" 9.9.9.9 "));
        assert_eq!(client_ip_from_headers(&h), Some("9.9.9.9"));
        assert_eq!(client_ip_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn client_hash_is_keyed_by_salt() {
        let a = hmac_hex16("salt-a", "1.2.3.4").expect("hmac");
        assert_eq!(a.len(), 32);
        assert_eq!(Some(a.clone()), hmac_hex16("salt-a", "1.2.3.4"));
        assert_ne!(Some(a.clone()), hmac_hex16("salt-a", "1.2.3.5"));
        assert_ne!(Some(a), hmac_hex16("salt-b", "1.2.3.4"));
    }

    #[test]
    fn client_is_omitted_without_salt() {
        let mut h = HeaderMap::new();
        h.insert("x-real-ip", HeaderValue::from_static("1.2.3.4"));

        let unsalted = AnalyticsState::new(AnalyticsMode::Production, None);
        assert_eq!(client_field(&unsalted, &h), None);

        let salted = AnalyticsState::new(AnalyticsMode::Production, Some("pepper"));
        let hashed = client_field(&salted, &h).expect("client");
        assert!(!hashed.contains("1.2.3.4"));
        assert_eq!(Some(hashed), hmac_hex16("pepper", "1.2.3.4"));
        assert_eq!(client_field(&salted, &HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn middleware_passes_responses_through() {
        use axum::{Router, body::Body, routing::get};
        use tower::ServiceExt;

        for state in [
            AnalyticsState::new(AnalyticsMode::Production, Some("pepper")),
            AnalyticsState::new(AnalyticsMode::Development, None),
            AnalyticsState::disabled(),
        ] {
            let app = Router::new()
                .route("/x", get(|| async { "ok" }))
                .layer(axum::middleware::from_fn_with_state(
                    state,
                    analytics_middleware,
                ));
            let res = app
                .oneshot(
                    axum::http::Request::builder()
                        .uri("/x")
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response");
            assert_eq!(res.status(), axum::http::StatusCode::OK);
        }
    }
}
