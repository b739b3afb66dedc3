//! 最新读数。
//!
//! - GET /temperatur
//! - GET /readings/latest

use api_contract::{ApiResponse, LatestReadingDto};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::AppState;
use crate::utils::response::{internal_error, not_found_error, table_missing_error};

pub async fn latest_reading(State(state): State<AppState>) -> Response {
    let target = &state.target;
    match state.readings.latest_reading(target).await {
        Ok(Some(reading)) => (
            StatusCode::OK,
            Json(ApiResponse::success(LatestReadingDto {
                table: target.table().to_string(),
                column: target.value_column().to_string(),
                value: reading.value,
            })),
        )
            .into_response(),
        Ok(None) => not_found_error(format!("no rows in {}", target.table())),
        Err(err) if err.is_undefined_table() => {
            warn!(target: "qdb.api", table = %target.table(), error = %err, "readings_table_missing");
            table_missing_error(&err)
        }
        Err(err) => {
            warn!(target: "qdb.api", table = %target.table(), error = %err, "latest_reading_failed");
            internal_error(&err)
        }
    }
}
