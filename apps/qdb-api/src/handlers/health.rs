//! 健康检查与存储连通性探测。

use api_contract::{ApiResponse, HealthDto, StoreStatusDto};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::AppState;
use crate::utils::response::storage_error;

/// 服务自身存活，不访问存储。
pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthDto {
            status: "ok".to_string(),
            message: "qdb-api is running".to_string(),
        })),
    )
        .into_response()
}

/// 执行一次 `now()` 查询，返回存储端时间。
pub async fn store_version(State(state): State<AppState>) -> Response {
    match state.readings.ping().await {
        Ok(store_time) => (
            StatusCode::OK,
            Json(ApiResponse::success(StoreStatusDto {
                status: "ok".to_string(),
                store_time,
            })),
        )
            .into_response(),
        Err(err) => {
            warn!(target: "qdb.api", error = %err, "store_ping_failed");
            storage_error(&err)
        }
    }
}
