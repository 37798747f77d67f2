//! HTTP Middleware
//!
//! 请求日志中间件：记录错误状态码和音频的缓存命中情况

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use super::handlers::{AUDIO_CACHE_HEADER, AUDIO_KEY_HEADER};

/// 请求日志中间件
///
/// 4xx/5xx 记录 warn/error；音频响应记录缓存状态和耗时。
/// 错误详情在 ApiError::into_response() 中记录
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else if let Some(cache) = response.headers().get(AUDIO_CACHE_HEADER) {
        let key = response
            .headers()
            .get(AUDIO_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info!(
            method = %method,
            cache = cache.to_str().unwrap_or("-"),
            key = key,
            elapsed_ms,
            "Audio served"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    async fn ok_handler() -> &'static str {
        "OK"
    }

    async fn not_found_handler() -> StatusCode {
        StatusCode::NOT_FOUND
    }

    async fn error_handler() -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    async fn audio_handler() -> ([(&'static str, &'static str); 2], &'static [u8]) {
        (
            [(AUDIO_CACHE_HEADER, "hit"), (AUDIO_KEY_HEADER, "entity_1_1")],
            b"RIFF",
        )
    }

    fn create_test_router() -> Router {
        Router::new()
            .route("/ok", get(ok_handler))
            .route("/not-found", get(not_found_handler))
            .route("/error", get(error_handler))
            .route("/audio", get(audio_handler))
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    #[tokio::test]
    async fn test_status_is_untouched() {
        let cases = [
            ("/ok", StatusCode::OK),
            ("/not-found", StatusCode::NOT_FOUND),
            ("/error", StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (uri, expected) in cases {
            let request = HttpRequest::builder()
                .uri(uri)
                .body(Body::empty())
                .unwrap();
            let response = create_test_router().oneshot(request).await.unwrap();
            assert_eq!(response.status(), expected, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_audio_headers_pass_through() {
        let app = create_test_router();
        let request = HttpRequest::builder()
            .uri("/audio")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[AUDIO_CACHE_HEADER], "hit");
        assert_eq!(response.headers()[AUDIO_KEY_HEADER], "entity_1_1");
    }
}
