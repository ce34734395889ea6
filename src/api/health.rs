//! 健康检查 API
//!
//! GET /health, GET /status

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::env::constants::VERSION;
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    started_at: String,
    uptime_secs: i64,
    /// query 产物目录布局
    artifact_scope: &'static str,
    artifact_root: String,
}

/// 创建健康检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(health_check))
}

/// 健康检查，无需认证
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    Json(HealthResponse {
        status: "ok",
        service: "registry-mirror-agent",
        version: VERSION,
        timestamp: now.to_rfc3339(),
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: (now - state.started_at).num_seconds(),
        artifact_scope: state.config.registry.artifact_scope.as_str(),
        artifact_root: state.config.registry.artifact_root.display().to_string(),
    })
}
