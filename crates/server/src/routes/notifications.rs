use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use tasks::Notification;
use utils_core::response::ApiResponse;

use crate::AppState;

/// Notifications raised since the previous call.
pub async fn drain_notifications(
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<Vec<Notification>>> {
    ResponseJson(ApiResponse::success(state.inbox().drain()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/notifications", get(drain_notifications))
}
