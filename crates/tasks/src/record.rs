//! Adapter between the generic repository and the two task collections.

use chrono::{DateTime, Utc};
pub use db::models::{
    shared_task::{CreateSharedTask, SharedTask, UpdateSharedTask},
    task::{CreateTask, Task, UpdateTask},
};
pub use db::types::TaskStatus;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use ts_rs::TS;
use uuid::Uuid;

use crate::{session::UserId, store::Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Personal,
    Shared,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Personal => "Task",
            RecordKind::Shared => "Shared task",
        }
    }
}

/// A status-tracked record kept in a [`crate::repository::Repository`] cache.
pub trait Record: Clone + Send + Sync + 'static {
    /// Insert payload handed to the store.
    type Draft: Send + Sync + 'static;
    /// Partial update handed to the store.
    type Patch: Clone + Send + Sync + 'static;

    const KIND: RecordKind;

    fn id(&self) -> Uuid;
    fn status(&self) -> TaskStatus;
    fn created_at(&self) -> DateTime<Utc>;

    fn draft_title(draft: &Self::Draft) -> &str;
    fn status_patch(status: TaskStatus) -> Self::Patch;

    /// Which records of this kind `user` fetches.
    fn scope(user: &UserId) -> Scope;

    /// Folds a store-confirmed copy into the cached one. Identity, creator
    /// and creation time never change after insert.
    fn reconcile(&mut self, confirmed: Self);
}

impl Record for Task {
    type Draft = CreateTask;
    type Patch = UpdateTask;

    const KIND: RecordKind = RecordKind::Personal;

    fn id(&self) -> Uuid {
        self.id
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn draft_title(draft: &CreateTask) -> &str {
        &draft.title
    }

    fn status_patch(status: TaskStatus) -> UpdateTask {
        UpdateTask::status(status)
    }

    fn scope(user: &UserId) -> Scope {
        Scope::Owner(user.clone())
    }

    fn reconcile(&mut self, confirmed: Task) {
        let Task {
            title,
            description,
            status,
            due_date,
            updated_at,
            ..
        } = confirmed;
        self.title = title;
        self.description = description;
        self.status = status;
        self.due_date = due_date;
        self.updated_at = updated_at;
    }
}

impl Record for SharedTask {
    type Draft = CreateSharedTask;
    type Patch = UpdateSharedTask;

    const KIND: RecordKind = RecordKind::Shared;

    fn id(&self) -> Uuid {
        self.id
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn draft_title(draft: &CreateSharedTask) -> &str {
        &draft.task_title
    }

    fn status_patch(status: TaskStatus) -> UpdateSharedTask {
        UpdateSharedTask::status(status)
    }

    fn scope(user: &UserId) -> Scope {
        Scope::Participant(user.clone())
    }

    fn reconcile(&mut self, confirmed: SharedTask) {
        let SharedTask {
            task_title,
            task_description,
            status,
            shared_with,
            updated_at,
            ..
        } = confirmed;
        self.task_title = task_title;
        self.task_description = task_description;
        self.status = status;
        self.shared_with = shared_with;
        self.updated_at = updated_at;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn task() -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            owner_id: "owner".to_string(),
            title: "Buy milk".to_string(),
            description: None,
            status: TaskStatus::Pending,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn reconcile_keeps_owner_and_creation_time() {
        let mut cached = task();
        let mut confirmed = cached.clone();
        confirmed.owner_id = "intruder".to_string();
        confirmed.created_at = cached.created_at + Duration::days(1);
        confirmed.title = "Buy oat milk".to_string();
        confirmed.status = TaskStatus::Completed;

        let original_owner = cached.owner_id.clone();
        let original_created = cached.created_at;
        cached.reconcile(confirmed);

        assert_eq!(cached.owner_id, original_owner);
        assert_eq!(cached.created_at, original_created);
        assert_eq!(cached.title, "Buy oat milk");
        assert_eq!(cached.status, TaskStatus::Completed);
    }

    #[test]
    fn reconcile_keeps_shared_task_creator() {
        let now = Utc::now();
        let mut cached = SharedTask {
            id: Uuid::new_v4(),
            task_title: "Plan trip".to_string(),
            task_description: None,
            status: TaskStatus::Pending,
            created_by: "creator".to_string(),
            shared_with: vec!["a@x.com".to_string()],
            created_at: now,
            updated_at: now,
        };
        let mut confirmed = cached.clone();
        confirmed.created_by = "someone".to_string();
        confirmed.shared_with = vec![];

        cached.reconcile(confirmed);

        assert_eq!(cached.created_by, "creator");
        assert!(cached.shared_with.is_empty());
    }

    #[test]
    fn scopes_follow_collection_access_rules() {
        let user = UserId::new("user-1").unwrap();
        assert_eq!(Task::scope(&user), Scope::Owner(user.clone()));
        assert_eq!(SharedTask::scope(&user), Scope::Participant(user.clone()));
    }
}
