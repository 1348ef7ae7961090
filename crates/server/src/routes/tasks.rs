use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasks::record::{Task, UpdateTask};
use ts_rs::TS;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

pub async fn get_tasks(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    state.require_user()?;
    Ok(ResponseJson(ApiResponse::success(
        state.board().tasks().records(),
    )))
}

pub async fn create_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state
        .board()
        .add_task(
            &payload.title,
            payload.description.as_deref(),
            payload.due_date,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state.board().update_task(task_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.board().delete_task(task_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = state.board().toggle_task_status(task_id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub fn router() -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", put(update_task).delete(delete_task))
        .route("/toggle", post(toggle_task));

    let inner = Router::new()
        .route("/", get(get_tasks).post(create_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/tasks", inner)
}
