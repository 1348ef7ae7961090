use axum::{
    Json, Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tasks::{BoardSnapshot, Filter, TaskType};
use ts_rs::TS;
use utils_core::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// Both keys are optional; absent keys use the board's current selection and
/// unknown ones fall back to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct BoardQuery {
    pub task_type: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct FilterBody {
    pub filter: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct TaskTypeBody {
    pub task_type: String,
}

pub async fn get_board(
    State(state): State<AppState>,
    Query(query): Query<BoardQuery>,
) -> ResponseJson<ApiResponse<BoardSnapshot>> {
    let board = state.board();
    let task_type = query
        .task_type
        .as_deref()
        .map(TaskType::from_key)
        .unwrap_or_else(|| board.current_task_type());
    let filter = query
        .filter
        .as_deref()
        .map(Filter::from_key)
        .unwrap_or_else(|| board.current_filter());
    ResponseJson(ApiResponse::success(board.snapshot_for(task_type, filter)))
}

/// Refetches both collections from the store and returns the board as
/// currently selected.
pub async fn refresh_board(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<BoardSnapshot>>, ApiError> {
    state.require_user()?;
    let board = state.board();
    board.refresh().await?;
    Ok(ResponseJson(ApiResponse::success(board.snapshot())))
}

pub async fn get_filter(State(state): State<AppState>) -> ResponseJson<ApiResponse<Filter>> {
    ResponseJson(ApiResponse::success(state.board().current_filter()))
}

pub async fn set_filter(
    State(state): State<AppState>,
    Json(payload): Json<FilterBody>,
) -> ResponseJson<ApiResponse<Filter>> {
    let filter = Filter::from_key(&payload.filter);
    state.board().set_filter(filter);
    ResponseJson(ApiResponse::success(filter))
}

pub async fn set_task_type(
    State(state): State<AppState>,
    Json(payload): Json<TaskTypeBody>,
) -> ResponseJson<ApiResponse<TaskType>> {
    let task_type = TaskType::from_key(&payload.task_type);
    state.board().set_task_type(task_type);
    ResponseJson(ApiResponse::success(task_type))
}

pub fn router() -> Router<AppState> {
    let inner = Router::new()
        .route("/", get(get_board))
        .route("/refresh", post(refresh_board))
        .route("/filter", get(get_filter).put(set_filter))
        .route("/task-type", put(set_task_type));

    Router::new().nest("/board", inner)
}
