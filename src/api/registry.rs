//! 镜像仓库端点 API
//!
//! - POST   /registry/endpoints              添加端点
//! - DELETE /registry/endpoints              删除端点
//! - GET    /registry/endpoints/:cluster_id  查询端点
//!
//! 业务结果统一放在信封里（HTTP 200），只有认证 / 请求格式错误返回 4xx

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::domain::registry::{RegistryConfigEntry, RegistryEndpointRequest, ResultEnvelope};
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireApiKey;
use crate::state::AppState;

/// 创建端点管理路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/registry/endpoints",
            post(add_endpoint).delete(remove_endpoint),
        )
        .route("/registry/endpoints/:cluster_id", get(query_endpoints))
}

/// 添加端点
///
/// POST /registry/endpoints
async fn add_endpoint(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegistryEndpointRequest>, JsonRejection>,
) -> ApiResult<Json<ResultEnvelope<()>>> {
    let request = parse_request(body)?;
    tracing::info!(
        cluster_id = %request.cluster_id,
        image_addr = %request.image_addr,
        hosts = request.hosts.len(),
        "Add registry endpoint requested"
    );
    Ok(Json(state.registry.add_endpoint(&request).await))
}

/// 删除端点
///
/// DELETE /registry/endpoints
async fn remove_endpoint(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegistryEndpointRequest>, JsonRejection>,
) -> ApiResult<Json<ResultEnvelope<()>>> {
    let request = parse_request(body)?;
    tracing::info!(
        cluster_id = %request.cluster_id,
        image_addr = %request.image_addr,
        hosts = request.hosts.len(),
        "Remove registry endpoint requested"
    );
    Ok(Json(state.registry.remove_endpoint(&request).await))
}

/// 查询端点
///
/// GET /registry/endpoints/:cluster_id
async fn query_endpoints(
    _auth: RequireApiKey,
    State(state): State<Arc<AppState>>,
    Path(cluster_id): Path<String>,
) -> ApiResult<Json<ResultEnvelope<Vec<RegistryConfigEntry>>>> {
    validate_cluster_id(&cluster_id)?;
    Ok(Json(state.registry.query_endpoints(&cluster_id).await))
}

fn parse_request(
    body: Result<Json<RegistryEndpointRequest>, JsonRejection>,
) -> ApiResult<RegistryEndpointRequest> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    validate_cluster_id(&request.cluster_id)?;
    if request.image_addr.trim().is_empty() {
        return Err(ApiError::bad_request("imageAddr must not be empty"));
    }
    Ok(request)
}

/// cluster id 会拼进 inventory 目录名，不允许路径分隔符
fn validate_cluster_id(cluster_id: &str) -> ApiResult<()> {
    if cluster_id.is_empty()
        || cluster_id.contains('/')
        || cluster_id.contains('\\')
        || cluster_id.contains("..")
    {
        return Err(ApiError::bad_request(format!(
            "Invalid cluster id '{}'",
            cluster_id
        )));
    }
    Ok(())
}
