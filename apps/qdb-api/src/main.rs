//! 查询服务：健康检查、存储连通性探测与最新读数，附带请求追踪 ID。

mod handlers;
mod routes;
mod utils;

use axum::{
    Router,
    body::Body,
    http::{HeaderValue, Request},
    middleware::{self, Next},
    response::Response,
};
use qdb_config::ApiConfig;
use qdb_storage::{PgReadingStore, ReadingStore, ReadingsTable, connect_options, connect_pool};
use qdb_telemetry::{init_tracing, new_request_ids};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info};

/// 服务状态：连接池在启动时建立，经由状态注入各 handler。
#[derive(Clone)]
pub struct AppState {
    pub readings: Arc<dyn ReadingStore>,
    pub target: ReadingsTable,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    let config = ApiConfig::from_env()?;
    init_tracing();

    // 表名/列名在启动时校验，非法即退出
    let target = ReadingsTable::new(
        config.readings_table.clone(),
        config.readings_value_column.clone(),
        config.readings_time_column.clone(),
    )?;
    let pool = connect_pool(
        connect_options(&config.store),
        config.pool_max_connections,
        config.store.connect_timeout,
    )
    .await?;
    let state = AppState {
        readings: Arc::new(PgReadingStore::new(pool)),
        target,
    };

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    info!(target: "qdb.api", addr = %config.http_addr, "api_listening");
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_app(state: AppState) -> Router {
    routes::create_api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // 注入 request_id/trace_id
        .layer(middleware::from_fn(request_context))
}

async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&ids.request_id) {
        headers.insert("x-request-id", value);
    }
    if let Ok(value) = HeaderValue::from_str(&ids.trace_id) {
        headers.insert("x-trace-id", value);
    }
    response
}
