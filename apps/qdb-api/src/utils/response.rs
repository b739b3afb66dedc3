//! HTTP 错误响应构造
//!
//! 所有错误返回统一的 ApiResponse 格式，状态码与错误码一一对应：
//! - 表为空：404 RESOURCE.NOT_FOUND
//! - 表不存在：500 STORAGE.TABLE_NOT_FOUND
//! - 存储探测失败：500 STORAGE.ERROR
//! - 其余：500 INTERNAL.ERROR

use api_contract::{ApiResponse, codes};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use qdb_storage::StorageError;

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ApiResponse::<()>::error(code, message))).into_response()
}

pub fn not_found_error(message: impl Into<String>) -> Response {
    error_response(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
}

pub fn table_missing_error(err: &StorageError) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::TABLE_NOT_FOUND,
        err.to_string(),
    )
}

pub fn storage_error(err: &StorageError) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::STORAGE_ERROR,
        err.to_string(),
    )
}

pub fn internal_error(err: &StorageError) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        codes::INTERNAL_ERROR,
        err.to_string(),
    )
}
