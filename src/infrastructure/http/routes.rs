//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping    GET   健康检查
//! - /api/tts     POST  获取题目或文本的语音（JSON 请求体）
//! - /api/tts     GET   同上（查询参数，供 `<audio src>` 使用）

use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route(
            "/tts",
            get(handlers::stream_speech).post(handlers::synthesize_speech),
        )
}
