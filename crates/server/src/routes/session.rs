use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::{Deserialize, Serialize};
use tasks::UserId;
use ts_rs::TS;
use utils_core::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct SessionInfo {
    pub user_id: Option<UserId>,
}

#[derive(Debug, Deserialize, TS)]
pub struct SignInRequest {
    pub user_id: String,
}

pub async fn get_session(State(state): State<AppState>) -> ResponseJson<ApiResponse<SessionInfo>> {
    ResponseJson(ApiResponse::success(SessionInfo {
        user_id: state.board().current_user(),
    }))
}

/// Signs in and loads both collections. A failed load is reported through
/// notifications; the session itself stays active.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<ResponseJson<ApiResponse<SessionInfo>>, ApiError> {
    let user = UserId::new(&payload.user_id)?;
    if let Err(err) = state.board().sign_in(user.clone()).await {
        tracing::warn!(user_id = %user, error = %err, "Initial task load failed");
    }
    Ok(ResponseJson(ApiResponse::success(SessionInfo {
        user_id: Some(user),
    })))
}

pub async fn sign_out(State(state): State<AppState>) -> ResponseJson<ApiResponse<SessionInfo>> {
    state.board().sign_out();
    ResponseJson(ApiResponse::success(SessionInfo { user_id: None }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/session", get(get_session).post(sign_in).delete(sign_out))
}
