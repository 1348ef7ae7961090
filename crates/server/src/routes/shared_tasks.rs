use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tasks::record::{SharedTask, UpdateSharedTask};
use ts_rs::TS;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct CreateSharedTaskRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub shared_with: Vec<String>,
}

pub async fn get_shared_tasks(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<SharedTask>>>, ApiError> {
    state.require_user()?;
    Ok(ResponseJson(ApiResponse::success(
        state.board().shared_tasks().records(),
    )))
}

pub async fn create_shared_task(
    State(state): State<AppState>,
    Json(payload): Json<CreateSharedTaskRequest>,
) -> Result<ResponseJson<ApiResponse<SharedTask>>, ApiError> {
    let task = state
        .board()
        .add_shared_task(
            &payload.title,
            payload.description.as_deref(),
            payload.shared_with,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        task,
        "Shared task created successfully!",
    )))
}

pub async fn update_shared_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(payload): Json<UpdateSharedTask>,
) -> Result<ResponseJson<ApiResponse<SharedTask>>, ApiError> {
    let task = state.board().update_shared_task(task_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        task,
        "Shared task updated!",
    )))
}

pub async fn delete_shared_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.board().delete_shared_task(task_id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "Shared task deleted!",
    )))
}

pub async fn toggle_shared_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<SharedTask>>, ApiError> {
    let task = state.board().toggle_shared_task_status(task_id).await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        task,
        "Shared task updated!",
    )))
}

pub fn router() -> Router<AppState> {
    let task_id_router = Router::new()
        .route("/", put(update_shared_task).delete(delete_shared_task))
        .route("/toggle", post(toggle_shared_task));

    let inner = Router::new()
        .route("/", get(get_shared_tasks).post(create_shared_task))
        .nest("/{task_id}", task_id_router);

    Router::new().nest("/shared-tasks", inner)
}
