use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{AppState, routes};

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::session::router())
        .merge(routes::board::router())
        .merge(routes::tasks::router())
        .merge(routes::shared_tasks::router())
        .merge(routes::notifications::router());

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use tasks::{
        BoardOptions, TaskBoard,
        record::{RecordKind, SharedTask, TaskStatus},
        store::{MemoryStore, StoreError, memory::StoreOp},
    };
    use tower::ServiceExt;

    use crate::AppState;

    fn setup() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let board = Arc::new(TaskBoard::new(store.clone(), BoardOptions::default()));
        (super::router(AppState::new(board)), store)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn sign_in(app: &Router, user_id: &str) {
        let response = send(
            app,
            Method::POST,
            "/api/session",
            Some(json!({ "user_id": user_id })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _) = setup();
        let response = send(&app, Method::GET, "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn task_commands_require_a_session() {
        let (app, store) = setup();

        let response = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "Buy milk" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, Method::GET, "/api/tasks", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_user_id_is_rejected() {
        let (app, _) = setup();
        let response = send(
            &app,
            Method::POST,
            "/api/session",
            Some(json!({ "user_id": "  " })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_toggle_and_read_the_board() {
        let (app, _) = setup();
        sign_in(&app, "alice").await;

        let response = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(json!({ "title": "Buy milk", "description": " 2 litres " })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let created = json_body(response).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["data"]["description"], "2 litres");

        let response = send(&app, Method::POST, &format!("/api/tasks/{id}/toggle"), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["status"], "completed");

        let response = send(&app, Method::GET, "/api/board?filter=completed", None).await;
        let board = json_body(response).await;
        assert_eq!(board["data"]["filter"], "completed");
        assert_eq!(board["data"]["task_type"], "personal");
        assert_eq!(board["data"]["tasks"][0]["priority"], "medium");
        assert_eq!(
            board["data"]["counts"],
            json!({ "all": 1, "pending": 0, "completed": 1, "shared": 0 })
        );
    }

    #[tokio::test]
    async fn empty_title_is_a_bad_request() {
        let (app, store) = setup();
        sign_in(&app, "alice").await;
        let calls_after_sign_in = store.calls().len();

        let response = send(&app, Method::POST, "/api/tasks", Some(json!({ "title": " " }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.calls().len(), calls_after_sign_in);
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let (app, _) = setup();
        sign_in(&app, "alice").await;

        let id = uuid::Uuid::new_v4();
        let response = send(&app, Method::DELETE, &format!("/api/shared-tasks/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, Method::POST, &format!("/api/tasks/{id}/toggle"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failures_are_bad_gateway_and_notified() {
        let (app, store) = setup();
        sign_in(&app, "alice").await;
        // Drop the sign-in noise.
        send(&app, Method::GET, "/api/notifications", None).await;

        store.fail_next(
            RecordKind::Shared,
            StoreOp::Insert,
            StoreError::Backend("disk full".to_string()),
        );
        let response = send(
            &app,
            Method::POST,
            "/api/shared-tasks",
            Some(json!({ "title": "Plan trip", "shared_with": ["a@x.com"] })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = send(&app, Method::GET, "/api/notifications", None).await;
        let notes = json_body(response).await;
        assert_eq!(notes["data"][0]["message"], "Failed to create shared task");
        assert_eq!(notes["data"][0]["level"], "error");
    }

    #[tokio::test]
    async fn filter_and_task_type_persist_on_the_board() {
        let (app, _) = setup();
        sign_in(&app, "alice").await;

        let response = send(
            &app,
            Method::PUT,
            "/api/board/filter",
            Some(json!({ "filter": "nonsense" })),
        )
        .await;
        assert_eq!(json_body(response).await["data"], "all");

        send(
            &app,
            Method::PUT,
            "/api/board/task-type",
            Some(json!({ "task_type": "shared" })),
        )
        .await;
        send(
            &app,
            Method::POST,
            "/api/shared-tasks",
            Some(json!({ "title": "Plan trip" })),
        )
        .await;

        let board = json_body(send(&app, Method::GET, "/api/board", None).await).await;
        assert_eq!(board["data"]["task_type"], "shared");
        assert_eq!(board["data"]["tasks"][0]["shared"], true);
        assert_eq!(board["data"]["counts"]["shared"], 1);
    }

    #[tokio::test]
    async fn sign_out_clears_the_session() {
        let (app, _) = setup();
        sign_in(&app, "alice").await;

        let response = send(&app, Method::DELETE, "/api/session", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let session = json_body(send(&app, Method::GET, "/api/session", None).await).await;
        assert_eq!(session["data"]["user_id"], Value::Null);
    }

    #[tokio::test]
    async fn refresh_picks_up_changes_made_by_collaborators() {
        let (app, store) = setup();
        let response = send(&app, Method::POST, "/api/board/refresh", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        sign_in(&app, "alice").await;
        send(
            &app,
            Method::PUT,
            "/api/board/task-type",
            Some(json!({ "task_type": "shared" })),
        )
        .await;

        let now = chrono::Utc::now();
        store.seed_shared_tasks([SharedTask {
            id: uuid::Uuid::new_v4(),
            task_title: "Plan trip".to_string(),
            task_description: None,
            status: TaskStatus::Pending,
            created_by: "carol".to_string(),
            shared_with: vec!["alice".to_string()],
            created_at: now,
            updated_at: now,
        }]);
        let listed = json_body(send(&app, Method::GET, "/api/shared-tasks", None).await).await;
        assert_eq!(listed["data"], json!([]));

        let response = send(&app, Method::POST, "/api/board/refresh", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let board = json_body(response).await;
        assert_eq!(board["data"]["task_type"], "shared");
        assert_eq!(board["data"]["tasks"][0]["title"], "Plan trip");
        assert_eq!(board["data"]["tasks"][0]["owner"], "carol");

        store.fail_next(
            RecordKind::Shared,
            StoreOp::Select,
            StoreError::Backend("down".to_string()),
        );
        let response = send(&app, Method::POST, "/api/board/refresh", None).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
