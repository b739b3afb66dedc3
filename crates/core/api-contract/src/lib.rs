//! 稳定的 DTO 与 API 响应契约。

use serde::Serialize;

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 服务自身健康状态。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDto {
    pub status: String,
    pub message: String,
}

/// 存储连通性探测结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatusDto {
    pub status: String,
    /// 存储端返回的当前时间（原样字符串）。
    pub store_time: String,
}

/// 最新读数。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReadingDto {
    pub table: String,
    pub column: String,
    pub value: Option<f64>,
}

/// 错误码常量。
pub mod codes {
    pub const NOT_FOUND: &str = "RESOURCE.NOT_FOUND";
    pub const TABLE_NOT_FOUND: &str = "STORAGE.TABLE_NOT_FOUND";
    pub const STORAGE_ERROR: &str = "STORAGE.ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL.ERROR";
}
