use async_trait::async_trait;
use db::{
    DBService, DbErr,
    models::{
        shared_task::{CreateSharedTask, SharedTask, UpdateSharedTask},
        task::{CreateTask, Task, UpdateTask},
    },
};
use sea_orm::sea_query::Order;
use uuid::Uuid;

use super::{RemoteStore, Scope, SortOrder, StoreError};

/// Store backed by the local SQLite database.
#[derive(Clone)]
pub struct DbStore {
    db: DBService,
}

impl DbStore {
    pub fn new(db: DBService) -> Self {
        Self { db }
    }
}

fn order(sort: SortOrder) -> Order {
    match sort {
        SortOrder::NewestFirst => Order::Desc,
        SortOrder::OldestFirst => Order::Asc,
    }
}

fn store_error(id: Option<Uuid>, err: DbErr) -> StoreError {
    match (err, id) {
        (DbErr::RecordNotFound(_), Some(id)) => StoreError::NotFound(id),
        (err, _) => StoreError::Backend(err.to_string()),
    }
}

#[async_trait]
impl RemoteStore<Task> for DbStore {
    async fn select(&self, scope: &Scope, sort: SortOrder) -> Result<Vec<Task>, StoreError> {
        let Scope::Owner(owner) = scope else {
            return Err(StoreError::Backend(
                "personal tasks can only be listed for their owner".to_string(),
            ));
        };
        Task::find_by_owner(&self.db.pool, owner.as_str(), order(sort))
            .await
            .map_err(|err| store_error(None, err))
    }

    async fn insert(&self, draft: CreateTask) -> Result<Task, StoreError> {
        Task::create(&self.db.pool, &draft)
            .await
            .map_err(|err| store_error(None, err))
    }

    async fn update(&self, id: Uuid, patch: UpdateTask) -> Result<Task, StoreError> {
        Task::update(&self.db.pool, id, &patch)
            .await
            .map_err(|err| store_error(Some(id), err))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let rows = Task::delete(&self.db.pool, id)
            .await
            .map_err(|err| store_error(Some(id), err))?;
        if rows == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore<SharedTask> for DbStore {
    async fn select(&self, scope: &Scope, sort: SortOrder) -> Result<Vec<SharedTask>, StoreError> {
        let tasks = SharedTask::find_all(&self.db.pool, order(sort))
            .await
            .map_err(|err| store_error(None, err))?;
        Ok(match scope {
            Scope::Unscoped => tasks,
            Scope::Owner(owner) => tasks
                .into_iter()
                .filter(|task| task.created_by == owner.as_str())
                .collect(),
            Scope::Participant(user) => tasks
                .into_iter()
                .filter(|task| task.is_visible_to(user.as_str()))
                .collect(),
        })
    }

    async fn insert(&self, draft: CreateSharedTask) -> Result<SharedTask, StoreError> {
        SharedTask::create(&self.db.pool, &draft)
            .await
            .map_err(|err| store_error(None, err))
    }

    async fn update(&self, id: Uuid, patch: UpdateSharedTask) -> Result<SharedTask, StoreError> {
        SharedTask::update(&self.db.pool, id, &patch)
            .await
            .map_err(|err| store_error(Some(id), err))
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let rows = SharedTask::delete(&self.db.pool, id)
            .await
            .map_err(|err| store_error(Some(id), err))?;
        if rows == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
