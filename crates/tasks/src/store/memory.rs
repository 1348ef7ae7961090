//! In-process store with call recording and failure injection.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{RemoteStore, Scope, SortOrder, StoreError};
use crate::record::{
    CreateSharedTask, CreateTask, RecordKind, SharedTask, Task, UpdateSharedTask, UpdateTask,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub kind: RecordKind,
    pub op: StoreOp,
    pub id: Option<Uuid>,
}

#[derive(Default)]
struct Inner {
    tasks: Vec<Task>,
    shared_tasks: Vec<SharedTask>,
    calls: Vec<StoreCall>,
    failures: VecDeque<(RecordKind, StoreOp, StoreError)>,
    offline: bool,
    latency: Option<Duration>,
    last_timestamp: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Every call that reached the store, in arrival order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn calls_for(&self, kind: RecordKind) -> Vec<StoreCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.kind == kind)
            .cloned()
            .collect()
    }

    /// Makes the next matching call fail with `error`.
    pub fn fail_next(&self, kind: RecordKind, op: StoreOp, error: StoreError) {
        self.lock().failures.push_back((kind, op, error));
    }

    /// While offline every call fails with a backend error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Delay applied before every call resolves.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.lock().latency = latency;
    }

    /// Inserts records directly, bypassing call recording.
    pub fn seed_tasks(&self, tasks: impl IntoIterator<Item = Task>) {
        self.lock().tasks.extend(tasks);
    }

    pub fn seed_shared_tasks(&self, tasks: impl IntoIterator<Item = SharedTask>) {
        self.lock().shared_tasks.extend(tasks);
    }

    pub fn stored_tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    pub fn stored_shared_tasks(&self) -> Vec<SharedTask> {
        self.lock().shared_tasks.clone()
    }

    /// Records the call, then waits out the configured latency and reports
    /// any injected failure.
    async fn begin(
        &self,
        kind: RecordKind,
        op: StoreOp,
        id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let latency = {
            let mut inner = self.lock();
            inner.calls.push(StoreCall { kind, op, id });
            inner.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.lock();
        if inner.offline {
            return Err(StoreError::Backend("store unreachable".to_string()));
        }
        let position = inner
            .failures
            .iter()
            .position(|(k, o, _)| *k == kind && *o == op);
        match position.and_then(|index| inner.failures.remove(index)) {
            Some((_, _, error)) => Err(error),
            None => Ok(()),
        }
    }
}

impl Inner {
    /// Strictly increasing, so creation order is never ambiguous.
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp
            && now <= last
        {
            now = last + chrono::Duration::microseconds(1);
        }
        self.last_timestamp = Some(now);
        now
    }
}

fn sort_by_created<T>(
    records: &mut [T],
    order: SortOrder,
    created_at: impl Fn(&T) -> DateTime<Utc>,
) {
    match order {
        SortOrder::NewestFirst => {
            records.sort_by_key(|record| std::cmp::Reverse(created_at(record)))
        }
        SortOrder::OldestFirst => records.sort_by_key(|record| created_at(record)),
    }
}

#[async_trait]
impl RemoteStore<Task> for MemoryStore {
    async fn select(&self, scope: &Scope, order: SortOrder) -> Result<Vec<Task>, StoreError> {
        self.begin(RecordKind::Personal, StoreOp::Select, None).await?;
        let Scope::Owner(owner) = scope else {
            return Err(StoreError::Backend(
                "personal tasks can only be listed for their owner".to_string(),
            ));
        };
        let mut tasks: Vec<Task> = self
            .lock()
            .tasks
            .iter()
            .filter(|task| task.owner_id == owner.as_str())
            .cloned()
            .collect();
        sort_by_created(&mut tasks, order, |task| task.created_at);
        Ok(tasks)
    }

    async fn insert(&self, draft: CreateTask) -> Result<Task, StoreError> {
        self.begin(RecordKind::Personal, StoreOp::Insert, None).await?;
        let mut inner = self.lock();
        let now = inner.next_timestamp();
        let task = Task {
            id: Uuid::new_v4(),
            owner_id: draft.owner_id,
            title: draft.title.trim().to_string(),
            description: trimmed(draft.description.as_deref()),
            status: draft.status.unwrap_or_default(),
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, patch: UpdateTask) -> Result<Task, StoreError> {
        self.begin(RecordKind::Personal, StoreOp::Update, Some(id)).await?;
        let mut inner = self.lock();
        let now = inner.next_timestamp();
        let task = inner
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(title) = patch.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = patch.description {
            task.description = trimmed(Some(&description));
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        task.updated_at = now;
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.begin(RecordKind::Personal, StoreOp::Delete, Some(id)).await?;
        let mut inner = self.lock();
        let before = inner.tasks.len();
        inner.tasks.retain(|task| task.id != id);
        if inner.tasks.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore<SharedTask> for MemoryStore {
    async fn select(&self, scope: &Scope, order: SortOrder) -> Result<Vec<SharedTask>, StoreError> {
        self.begin(RecordKind::Shared, StoreOp::Select, None).await?;
        let mut tasks: Vec<SharedTask> = self
            .lock()
            .shared_tasks
            .iter()
            .filter(|task| match scope {
                Scope::Unscoped => true,
                Scope::Owner(owner) => task.created_by == owner.as_str(),
                Scope::Participant(user) => task.is_visible_to(user.as_str()),
            })
            .cloned()
            .collect();
        sort_by_created(&mut tasks, order, |task| task.created_at);
        Ok(tasks)
    }

    async fn insert(&self, draft: CreateSharedTask) -> Result<SharedTask, StoreError> {
        self.begin(RecordKind::Shared, StoreOp::Insert, None).await?;
        let mut inner = self.lock();
        let now = inner.next_timestamp();
        let task = SharedTask {
            id: Uuid::new_v4(),
            task_title: draft.task_title.trim().to_string(),
            task_description: trimmed(draft.task_description.as_deref()),
            status: draft.status.unwrap_or_default(),
            created_by: draft.created_by,
            shared_with: draft.shared_with,
            created_at: now,
            updated_at: now,
        };
        inner.shared_tasks.push(task.clone());
        Ok(task)
    }

    async fn update(&self, id: Uuid, patch: UpdateSharedTask) -> Result<SharedTask, StoreError> {
        self.begin(RecordKind::Shared, StoreOp::Update, Some(id)).await?;
        let mut inner = self.lock();
        let now = inner.next_timestamp();
        let task = inner
            .shared_tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(StoreError::NotFound(id))?;
        if let Some(task_title) = patch.task_title {
            task.task_title = task_title.trim().to_string();
        }
        if let Some(task_description) = patch.task_description {
            task.task_description = trimmed(Some(&task_description));
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(shared_with) = patch.shared_with {
            task.shared_with = shared_with;
        }
        task.updated_at = now;
        Ok(task.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        self.begin(RecordKind::Shared, StoreOp::Delete, Some(id)).await?;
        let mut inner = self.lock();
        let before = inner.shared_tasks.len();
        inner.shared_tasks.retain(|task| task.id != id);
        if inner.shared_tasks.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::UserId;

    fn draft(owner: &str, title: &str) -> CreateTask {
        CreateTask::from_title_description(owner.to_string(), title.to_string(), None)
    }

    #[tokio::test]
    async fn records_calls_and_injects_failures() {
        let store = MemoryStore::new();
        store.fail_next(
            RecordKind::Personal,
            StoreOp::Insert,
            StoreError::Backend("boom".to_string()),
        );

        let first = RemoteStore::<Task>::insert(&store, draft("u", "a")).await;
        assert_eq!(first.unwrap_err(), StoreError::Backend("boom".to_string()));
        let second = RemoteStore::<Task>::insert(&store, draft("u", "a")).await;
        assert!(second.is_ok());

        let calls = store.calls_for(RecordKind::Personal);
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|call| call.op == StoreOp::Insert));
        assert_eq!(store.stored_tasks().len(), 1);
    }

    #[tokio::test]
    async fn select_orders_by_creation_time() {
        let store = MemoryStore::new();
        let a = RemoteStore::<Task>::insert(&store, draft("u", "a")).await.unwrap();
        let b = RemoteStore::<Task>::insert(&store, draft("u", "b")).await.unwrap();
        RemoteStore::<Task>::insert(&store, draft("v", "other")).await.unwrap();

        let scope = Scope::Owner(UserId::new("u").unwrap());
        let newest: Vec<Task> = store.select(&scope, SortOrder::NewestFirst).await.unwrap();
        assert_eq!(newest.iter().map(|t| t.id).collect::<Vec<_>>(), vec![b.id, a.id]);

        let oldest: Vec<Task> = store.select(&scope, SortOrder::OldestFirst).await.unwrap();
        assert_eq!(oldest.iter().map(|t| t.id).collect::<Vec<_>>(), vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn offline_store_rejects_everything() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let result: Result<Vec<SharedTask>, _> =
            store.select(&Scope::Unscoped, SortOrder::NewestFirst).await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn shared_select_for_participant_skips_outsiders() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let shared = |created_by: &str, shared_with: &[&str]| SharedTask {
            id: Uuid::new_v4(),
            task_title: format!("{created_by}'s task"),
            task_description: None,
            status: Default::default(),
            created_by: created_by.to_string(),
            shared_with: shared_with.iter().map(|id| id.to_string()).collect(),
            created_at: now,
            updated_at: now,
        };
        let own = shared("alice", &[]);
        let invited = shared("carol", &["alice"]);
        store.seed_shared_tasks([own.clone(), invited.clone(), shared("carol", &["bob"])]);

        let scope = Scope::Participant(UserId::new("alice").unwrap());
        let listed: Vec<SharedTask> = store.select(&scope, SortOrder::NewestFirst).await.unwrap();
        let mut visible: Vec<Uuid> = listed.iter().map(|task| task.id).collect();
        visible.sort();
        let mut expected = vec![own.id, invited.id];
        expected.sort();
        assert_eq!(visible, expected);
        assert_eq!(store.stored_shared_tasks().len(), 3);
    }
}
