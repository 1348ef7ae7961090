pub mod board;
pub mod error;
pub mod notify;
pub mod record;
pub mod repository;
pub mod session;
pub mod store;
pub mod view;

pub use board::{BoardOptions, BoardSnapshot, TaskBoard, TaskType};
pub use error::RepositoryError;
pub use notify::{Notification, NotificationInbox, Notifier};
pub use repository::{
    FetchOutcome, PendingOperation, Repository, SharedTaskRepository, TaskRepository,
};
pub use session::{SessionContext, UserId};
pub use view::{Filter, TaskCounts, TaskView};
