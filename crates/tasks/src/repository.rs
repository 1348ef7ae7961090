//! Generic cache of one record collection, reconciled with a remote store.
//!
//! Every mutation goes to the store first; the cache only changes once the
//! store has confirmed. Results that arrive after the session identity has
//! changed are dropped.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    error::{RepositoryError, validate_title},
    notify::{Notification, Notifier, Operation},
    record::{CreateSharedTask, CreateTask, Record, SharedTask, Task, TaskStatus},
    session::UserId,
    store::{RemoteStore, SortOrder},
};

pub type TaskRepository = Repository<Task>;
pub type SharedTaskRepository = Repository<SharedTask>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum PendingOperation {
    Update,
    Toggle,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Loaded(usize),
    /// No user is signed in, so nothing was requested.
    Skipped,
    /// The session changed while the request was in flight.
    Discarded,
}

struct CacheState<R> {
    user: Option<UserId>,
    generation: u64,
    records: Vec<R>,
    fetches_in_flight: usize,
}

impl<R> Default for CacheState<R> {
    fn default() -> Self {
        Self {
            user: None,
            generation: 0,
            records: Vec::new(),
            fetches_in_flight: 0,
        }
    }
}

pub struct Repository<R: Record> {
    store: Arc<dyn RemoteStore<R>>,
    state: RwLock<CacheState<R>>,
    record_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    pending: DashMap<Uuid, PendingOperation>,
    notifier: Notifier,
}

/// Held for the duration of one mutation on one record.
struct RecordGuard<'a, R: Record> {
    repo: &'a Repository<R>,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl<R: Record> Drop for RecordGuard<'_, R> {
    fn drop(&mut self) {
        // Clear the marker before the next waiter can set its own.
        self.repo.pending.remove(&self.id);
        self.guard.take();
        self.repo
            .record_locks
            .remove_if(&self.id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

fn newest_first<R: Record>(records: &mut [R]) {
    records.sort_by_key(|record| std::cmp::Reverse(record.created_at()));
}

impl<R: Record> Repository<R> {
    pub fn new(store: Arc<dyn RemoteStore<R>>, notifier: Notifier) -> Self {
        Self {
            store,
            state: RwLock::new(CacheState::default()),
            record_locks: DashMap::new(),
            pending: DashMap::new(),
            notifier,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<R>> {
        self.state.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<R>> {
        self.state.write().unwrap_or_else(|err| err.into_inner())
    }

    /// Switches to `user`, dropping everything cached for the previous one.
    pub fn reset(&self, user: Option<UserId>) {
        let mut state = self.write();
        state.generation += 1;
        state.user = user;
        state.records.clear();
        state.fetches_in_flight = 0;
        tracing::debug!(
            kind = %R::KIND,
            generation = state.generation,
            user_id = ?state.user.as_ref().map(UserId::as_str),
            "Repository reset"
        );
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.read().user.clone()
    }

    /// Cached records, newest first.
    pub fn records(&self) -> Vec<R> {
        self.read().records.clone()
    }

    pub fn get(&self, id: Uuid) -> Option<R> {
        self.read()
            .records
            .iter()
            .find(|record| record.id() == id)
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.read().fetches_in_flight > 0
    }

    pub fn pending_operation(&self, id: Uuid) -> Option<PendingOperation> {
        self.pending.get(&id).map(|entry| *entry)
    }

    fn session(&self) -> Result<(UserId, u64), RepositoryError> {
        let state = self.read();
        let user = state.user.clone().ok_or(RepositoryError::NoSession)?;
        Ok((user, state.generation))
    }

    async fn lock_record(&self, id: Uuid, operation: PendingOperation) -> RecordGuard<'_, R> {
        let lock = self.record_locks.entry(id).or_default().clone();
        let guard = lock.lock_owned().await;
        self.pending.insert(id, operation);
        RecordGuard {
            repo: self,
            id,
            guard: Some(guard),
        }
    }

    /// Runs `apply` on the cache if it still belongs to `generation`.
    fn apply_current(&self, generation: u64, apply: impl FnOnce(&mut CacheState<R>)) -> bool {
        let mut state = self.write();
        if state.generation != generation {
            tracing::warn!(
                kind = %R::KIND,
                started = generation,
                current = state.generation,
                "Discarding result for a previous session"
            );
            return false;
        }
        apply(&mut state);
        true
    }

    fn succeed(&self, operation: Operation) {
        if let Some(notification) = Notification::success(R::KIND, operation) {
            self.notifier.send(notification);
        }
    }

    fn fail(&self, operation: Operation, err: RepositoryError) -> RepositoryError {
        tracing::error!(
            kind = %R::KIND,
            operation = %operation,
            error = %err,
            "Task operation failed"
        );
        self.notifier.send(Notification::failure(R::KIND, operation));
        err
    }

    pub async fn fetch_all(&self) -> Result<FetchOutcome, RepositoryError> {
        let (user, generation) = {
            let mut state = self.write();
            let Some(user) = state.user.clone() else {
                return Ok(FetchOutcome::Skipped);
            };
            state.fetches_in_flight += 1;
            (user, state.generation)
        };

        let result = self
            .store
            .select(&R::scope(&user), SortOrder::NewestFirst)
            .await;

        let mut loaded = None;
        let current = self.apply_current(generation, |state| {
            state.fetches_in_flight = state.fetches_in_flight.saturating_sub(1);
            if let Ok(records) = &result {
                let mut records = records.clone();
                newest_first(&mut records);
                loaded = Some(records.len());
                state.records = records;
            }
        });
        if !current {
            return Ok(FetchOutcome::Discarded);
        }

        match result {
            Ok(_) => {
                let count = loaded.unwrap_or_default();
                tracing::debug!(kind = %R::KIND, count, "Fetched records");
                Ok(FetchOutcome::Loaded(count))
            }
            Err(err) => Err(self.fail(
                Operation::Fetch,
                RepositoryError::from_store(R::KIND, err),
            )),
        }
    }

    /// Inserts a record built for the signed-in user and prepends the
    /// confirmed copy to the cache.
    pub async fn create(
        &self,
        build: impl FnOnce(&UserId) -> R::Draft,
    ) -> Result<R, RepositoryError> {
        let (user, generation) = self.session()?;
        let draft = build(&user);
        if R::draft_title(&draft).trim().is_empty() {
            return Err(RepositoryError::EmptyTitle);
        }

        let created = self.store.insert(draft).await.map_err(|err| {
            self.fail(Operation::Create, RepositoryError::from_store(R::KIND, err))
        })?;

        self.apply_current(generation, |state| {
            state.records.retain(|record| record.id() != created.id());
            state.records.insert(0, created.clone());
        });
        tracing::debug!(kind = %R::KIND, id = %created.id(), "Created record");
        self.succeed(Operation::Create);
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, RepositoryError> {
        let _guard = self.lock_record(id, PendingOperation::Update).await;
        let (_, generation) = self.session()?;
        let updated = self.send_update(id, patch, generation, Operation::Update).await?;
        self.succeed(Operation::Update);
        Ok(updated)
    }

    /// Flips the cached status. The status is read after the record lock is
    /// held, so concurrent toggles apply one after another.
    pub async fn toggle_status(&self, id: Uuid) -> Result<R, RepositoryError> {
        let _guard = self.lock_record(id, PendingOperation::Toggle).await;
        let (_, generation) = self.session()?;
        let status: TaskStatus = self
            .get(id)
            .map(|record| record.status())
            .ok_or(RepositoryError::NotFound { kind: R::KIND, id })
            .map_err(|err| self.fail(Operation::Toggle, err))?;

        let patch = R::status_patch(status.toggled());
        let updated = self.send_update(id, patch, generation, Operation::Toggle).await?;
        self.succeed(Operation::Toggle);
        Ok(updated)
    }

    async fn send_update(
        &self,
        id: Uuid,
        patch: R::Patch,
        generation: u64,
        operation: Operation,
    ) -> Result<R, RepositoryError> {
        let confirmed = self.store.update(id, patch).await.map_err(|err| {
            self.fail(operation, RepositoryError::from_store(R::KIND, err))
        })?;

        let mut result = confirmed.clone();
        self.apply_current(generation, |state| {
            if let Some(cached) = state.records.iter_mut().find(|record| record.id() == id) {
                cached.reconcile(confirmed);
                result = cached.clone();
            }
        });
        tracing::debug!(kind = %R::KIND, id = %id, operation = %operation, "Updated record");
        Ok(result)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let _guard = self.lock_record(id, PendingOperation::Delete).await;
        let (_, generation) = self.session()?;
        self.store.delete(id).await.map_err(|err| {
            self.fail(Operation::Delete, RepositoryError::from_store(R::KIND, err))
        })?;

        self.apply_current(generation, |state| {
            state.records.retain(|record| record.id() != id);
        });
        tracing::debug!(kind = %R::KIND, id = %id, "Deleted record");
        self.succeed(Operation::Delete);
        Ok(())
    }
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl Repository<Task> {
    pub async fn add(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Task, RepositoryError> {
        let title = validate_title(title)?;
        let description = optional_text(description);
        self.create(|user| CreateTask {
            owner_id: user.to_string(),
            title,
            description,
            status: Some(TaskStatus::Pending),
            due_date,
        })
        .await
    }
}

impl Repository<SharedTask> {
    pub async fn add(
        &self,
        title: &str,
        description: Option<&str>,
        shared_with: Vec<String>,
    ) -> Result<SharedTask, RepositoryError> {
        let title = validate_title(title)?;
        let description = optional_text(description);
        self.create(|user| CreateSharedTask {
            task_title: title,
            task_description: description,
            created_by: user.to_string(),
            shared_with,
            status: Some(TaskStatus::Pending),
        })
        .await
    }
}
