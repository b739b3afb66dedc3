//! 路由定义
//!
//! - 健康检查：/、/health
//! - 存储连通性：/qdbversion
//! - 最新读数：/temperatur（同 /readings/latest）

use super::AppState;
use super::handlers::*;
use axum::{Router, routing::get};

pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/qdbversion", get(store_version))
        .route("/temperatur", get(latest_reading))
        .route("/readings/latest", get(latest_reading))
}
