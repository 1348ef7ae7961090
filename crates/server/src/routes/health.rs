use axum::response::Json as ResponseJson;
use utils_core::response::ApiResponse;

pub async fn health_check() -> ResponseJson<ApiResponse<String>> {
    ResponseJson(ApiResponse::success("OK".to_string()))
}
