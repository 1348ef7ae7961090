use std::sync::Arc;

use tasks::{NotificationInbox, TaskBoard, UserId};

pub mod error;
pub mod http;
pub mod routes;

use error::ApiError;

/// Shared handler state: the board and the inbox the notifications route
/// drains.
#[derive(Clone)]
pub struct AppState {
    board: Arc<TaskBoard>,
    inbox: Arc<NotificationInbox>,
}

impl AppState {
    pub fn new(board: Arc<TaskBoard>) -> Self {
        let inbox = Arc::new(board.notifications());
        Self { board, inbox }
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    pub fn inbox(&self) -> &NotificationInbox {
        &self.inbox
    }

    pub fn require_user(&self) -> Result<UserId, ApiError> {
        self.board
            .current_user()
            .ok_or(ApiError::Repository(tasks::RepositoryError::NoSession))
    }
}
