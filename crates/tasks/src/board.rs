//! Command surface tying the session, both repositories and the view state
//! together.

use std::sync::{Arc, RwLock, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tokio::task::JoinHandle;
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    error::{RepositoryError, validate_title},
    notify::{NotificationInbox, Notifier},
    record::{SharedTask, Task, UpdateSharedTask, UpdateTask},
    repository::{FetchOutcome, SharedTaskRepository, TaskRepository},
    session::{SessionContext, UserId},
    store::RemoteStore,
    view::{self, Filter, TaskCounts, TaskSource, TaskView},
};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskType {
    #[default]
    Personal,
    Shared,
}

impl TaskType {
    /// Unknown keys fall back to personal tasks.
    pub fn from_key(key: &str) -> Self {
        key.trim().to_ascii_lowercase().parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct BoardOptions {
    pub default_filter: Filter,
    pub default_task_type: TaskType,
    pub notification_capacity: usize,
}

impl Default for BoardOptions {
    fn default() -> Self {
        Self {
            default_filter: Filter::All,
            default_task_type: TaskType::Personal,
            notification_capacity: crate::notify::DEFAULT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct BoardSnapshot {
    pub task_type: TaskType,
    pub filter: Filter,
    pub tasks: Vec<TaskView>,
    pub counts: TaskCounts,
    pub loading: bool,
}

#[derive(Debug, Clone, Copy)]
struct ViewState {
    filter: Filter,
    task_type: TaskType,
}

pub struct TaskBoard {
    session: SessionContext,
    tasks: TaskRepository,
    shared_tasks: SharedTaskRepository,
    notifier: Notifier,
    view: RwLock<ViewState>,
}

fn trim_description(description: Option<String>) -> Option<String> {
    description.map(|text| text.trim().to_string())
}

impl TaskBoard {
    /// Board over a single store serving both collections.
    pub fn new<S>(store: Arc<S>, options: BoardOptions) -> Self
    where
        S: RemoteStore<Task> + RemoteStore<SharedTask> + 'static,
    {
        Self::with_stores(store.clone(), store, options)
    }

    pub fn with_stores(
        task_store: Arc<dyn RemoteStore<Task>>,
        shared_store: Arc<dyn RemoteStore<SharedTask>>,
        options: BoardOptions,
    ) -> Self {
        let notifier = Notifier::new(options.notification_capacity);
        Self {
            session: SessionContext::new(),
            tasks: TaskRepository::new(task_store, notifier.clone()),
            shared_tasks: SharedTaskRepository::new(shared_store, notifier.clone()),
            notifier,
            view: RwLock::new(ViewState {
                filter: options.default_filter,
                task_type: options.default_task_type,
            }),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn tasks(&self) -> &TaskRepository {
        &self.tasks
    }

    pub fn shared_tasks(&self) -> &SharedTaskRepository {
        &self.shared_tasks
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notifications(&self) -> NotificationInbox {
        self.notifier.inbox()
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.session.current_user()
    }

    fn view_state(&self) -> ViewState {
        *self.view.read().unwrap_or_else(|err| err.into_inner())
    }

    pub fn current_filter(&self) -> Filter {
        self.view_state().filter
    }

    pub fn set_filter(&self, filter: Filter) {
        self.view.write().unwrap_or_else(|err| err.into_inner()).filter = filter;
    }

    pub fn current_task_type(&self) -> TaskType {
        self.view_state().task_type
    }

    pub fn set_task_type(&self, task_type: TaskType) {
        self.view
            .write()
            .unwrap_or_else(|err| err.into_inner())
            .task_type = task_type;
    }

    fn reset_repositories(&self, user: Option<UserId>) {
        self.tasks.reset(user.clone());
        self.shared_tasks.reset(user);
    }

    /// Switches both collections to `user` and loads them.
    pub async fn sign_in(&self, user: UserId) -> Result<(), RepositoryError> {
        self.reset_repositories(Some(user.clone()));
        self.session.sign_in(user);
        self.refresh().await.map(|_| ())
    }

    pub fn sign_out(&self) {
        self.reset_repositories(None);
        self.session.sign_out();
    }

    /// Refetches both collections. Both requests run even if one fails.
    pub async fn refresh(&self) -> Result<(FetchOutcome, FetchOutcome), RepositoryError> {
        let (tasks, shared_tasks) =
            futures::join!(self.tasks.fetch_all(), self.shared_tasks.fetch_all());
        Ok((tasks?, shared_tasks?))
    }

    /// Follows session changes made through [`SessionContext`] directly.
    /// The task ends once the board is dropped.
    pub fn watch_session(self: &Arc<Self>) -> JoinHandle<()> {
        let board: Weak<Self> = Arc::downgrade(self);
        let mut rx = self.session.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let user = rx.borrow_and_update().clone();
                let Some(board) = board.upgrade() else {
                    break;
                };
                if board.tasks.current_user() == user && board.shared_tasks.current_user() == user
                {
                    continue;
                }
                board.reset_repositories(user.clone());
                if user.is_some()
                    && let Err(err) = board.refresh().await
                {
                    tracing::warn!(error = %err, "Refetch after session change failed");
                }
            }
        })
    }

    pub async fn add_task(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task, RepositoryError> {
        tracing::debug!(title, "Adding task");
        self.tasks.add(title, description, due_date).await
    }

    /// Applies an edit, trimming the submitted text first.
    pub async fn update_task(&self, id: Uuid, patch: UpdateTask) -> Result<Task, RepositoryError> {
        tracing::debug!(%id, "Updating task");
        let patch = UpdateTask {
            title: patch.title.as_deref().map(validate_title).transpose()?,
            description: trim_description(patch.description),
            ..patch
        };
        self.tasks.update(id, patch).await
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<(), RepositoryError> {
        tracing::debug!(%id, "Deleting task");
        self.tasks.delete(id).await
    }

    pub async fn toggle_task_status(&self, id: Uuid) -> Result<Task, RepositoryError> {
        tracing::debug!(%id, "Toggling task");
        self.tasks.toggle_status(id).await
    }

    pub async fn add_shared_task(
        &self,
        title: &str,
        description: Option<&str>,
        shared_with: Vec<String>,
    ) -> Result<SharedTask, RepositoryError> {
        tracing::debug!(title, collaborators = shared_with.len(), "Adding shared task");
        self.shared_tasks.add(title, description, shared_with).await
    }

    pub async fn update_shared_task(
        &self,
        id: Uuid,
        patch: UpdateSharedTask,
    ) -> Result<SharedTask, RepositoryError> {
        tracing::debug!(%id, "Updating shared task");
        let patch = UpdateSharedTask {
            task_title: patch.task_title.as_deref().map(validate_title).transpose()?,
            task_description: trim_description(patch.task_description),
            ..patch
        };
        self.shared_tasks.update(id, patch).await
    }

    pub async fn delete_shared_task(&self, id: Uuid) -> Result<(), RepositoryError> {
        tracing::debug!(%id, "Deleting shared task");
        self.shared_tasks.delete(id).await
    }

    pub async fn toggle_shared_task_status(&self, id: Uuid) -> Result<SharedTask, RepositoryError> {
        tracing::debug!(%id, "Toggling shared task");
        self.shared_tasks.toggle_status(id).await
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let state = self.view_state();
        self.snapshot_for(state.task_type, state.filter)
    }

    /// Views of `task_type` narrowed by `filter`; counts cover the whole
    /// collection.
    pub fn snapshot_for(&self, task_type: TaskType, filter: Filter) -> BoardSnapshot {
        let (views, loading) = match task_type {
            TaskType::Personal => (
                view::normalize(TaskSource::Personal(&self.tasks.records())),
                self.tasks.is_loading(),
            ),
            TaskType::Shared => (
                view::normalize(TaskSource::Shared(&self.shared_tasks.records())),
                self.shared_tasks.is_loading(),
            ),
        };
        BoardSnapshot {
            task_type,
            filter,
            counts: view::count_by_category(&views),
            tasks: view::filter(&views, filter),
            loading,
        }
    }
}
