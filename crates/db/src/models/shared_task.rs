use chrono::{DateTime, Utc};
use sea_orm::sea_query::Order;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JsonValue, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::TaskStatus;
use crate::{
    entities::shared_task,
    events::{EVENT_SHARED_TASK_CREATED, EVENT_SHARED_TASK_DELETED, EVENT_SHARED_TASK_UPDATED},
    models::normalize_text,
    retry::retry_on_sqlite_busy,
};

/// A task with one creator and any number of collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct SharedTask {
    pub id: Uuid,
    pub task_title: String,
    pub task_description: Option<String>,
    pub status: TaskStatus,
    pub created_by: String,
    pub shared_with: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateSharedTask {
    pub task_title: String,
    pub task_description: Option<String>,
    pub created_by: String,
    #[serde(default)]
    pub shared_with: Vec<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct UpdateSharedTask {
    pub task_title: Option<String>,
    pub task_description: Option<String>,
    pub status: Option<TaskStatus>,
    pub shared_with: Option<Vec<String>>,
}

impl UpdateSharedTask {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

fn collaborators_to_json(shared_with: &[String]) -> Result<JsonValue, DbErr> {
    let cleaned: Vec<&str> = shared_with
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .collect();
    serde_json::to_value(cleaned).map_err(|err| DbErr::Custom(err.to_string()))
}

impl SharedTask {
    fn from_model(model: shared_task::Model) -> Result<Self, DbErr> {
        let shared_with: Vec<String> = serde_json::from_value(model.shared_with)
            .map_err(|err| DbErr::Custom(format!("Invalid shared_with column: {err}")))?;
        Ok(Self {
            id: model.uuid,
            task_title: model.task_title,
            task_description: model.task_description,
            status: model.status,
            created_by: model.created_by,
            shared_with,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }

    /// Creator and collaborators see the task; nobody else does.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.created_by == user_id || self.shared_with.iter().any(|member| member == user_id)
    }

    pub async fn find_all<C: ConnectionTrait>(db: &C, order: Order) -> Result<Vec<Self>, DbErr> {
        let models = shared_task::Entity::find()
            .order_by(shared_task::Column::CreatedAt, order.clone())
            .order_by(shared_task::Column::Id, order)
            .all(db)
            .await?;
        models.into_iter().map(Self::from_model).collect()
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = shared_task::Entity::find()
            .filter(shared_task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        record.map(Self::from_model).transpose()
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        data: &CreateSharedTask,
    ) -> Result<Self, DbErr> {
        let task_title = data.task_title.trim();
        if task_title.is_empty() {
            return Err(DbErr::Custom("Shared task title cannot be empty".to_string()));
        }
        let shared_with = collaborators_to_json(&data.shared_with)?;

        let task_id = Uuid::new_v4();
        let model = retry_on_sqlite_busy(|| {
            let now = Utc::now();
            let active = shared_task::ActiveModel {
                uuid: Set(task_id),
                task_title: Set(task_title.to_string()),
                task_description: Set(normalize_text(data.task_description.as_deref())),
                status: Set(data.status.unwrap_or_default()),
                created_by: Set(data.created_by.clone()),
                shared_with: Set(shared_with.clone()),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                ..Default::default()
            };
            active.insert(db)
        })
        .await?;

        tracing::debug!(
            event = EVENT_SHARED_TASK_CREATED,
            shared_task_id = %task_id,
            "Shared task persisted"
        );
        Self::from_model(model)
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateSharedTask,
    ) -> Result<Self, DbErr> {
        let record = shared_task::Entity::find()
            .filter(shared_task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Shared task not found".to_string()))?;

        let mut active: shared_task::ActiveModel = record.into();
        if let Some(task_title) = data.task_title.as_deref() {
            active.task_title = Set(task_title.trim().to_string());
        }
        if let Some(task_description) = data.task_description.as_deref() {
            active.task_description = Set(normalize_text(Some(task_description)));
        }
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        if let Some(shared_with) = data.shared_with.as_deref() {
            active.shared_with = Set(collaborators_to_json(shared_with)?);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = retry_on_sqlite_busy(|| active.clone().update(db)).await?;
        tracing::debug!(
            event = EVENT_SHARED_TASK_UPDATED,
            shared_task_id = %id,
            "Shared task persisted"
        );
        Self::from_model(updated)
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = retry_on_sqlite_busy(|| {
            shared_task::Entity::delete_many()
                .filter(shared_task::Column::Uuid.eq(id))
                .exec(db)
        })
        .await?;

        if result.rows_affected > 0 {
            tracing::debug!(
                event = EVENT_SHARED_TASK_DELETED,
                shared_task_id = %id,
                "Shared task removed"
            );
        }
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    fn create(title: &str, shared_with: &[&str]) -> CreateSharedTask {
        CreateSharedTask {
            task_title: title.to_string(),
            task_description: None,
            created_by: "creator".to_string(),
            shared_with: shared_with.iter().map(|s| s.to_string()).collect(),
            status: None,
        }
    }

    #[tokio::test]
    async fn collaborators_round_trip_in_order() {
        let db = setup_db().await;

        let task = SharedTask::create(&db, &create("Plan trip", &["b@x.com", " a@x.com ", ""]))
            .await
            .unwrap();
        assert_eq!(task.shared_with, vec!["b@x.com", "a@x.com"]);
        assert_eq!(task.status, TaskStatus::Pending);

        let found = SharedTask::find_by_id(&db, task.id).await.unwrap().unwrap();
        assert_eq!(found.shared_with, vec!["b@x.com", "a@x.com"]);
        assert_eq!(found.created_by, "creator");
    }

    #[tokio::test]
    async fn update_replaces_collaborators_and_keeps_creator() {
        let db = setup_db().await;
        let task = SharedTask::create(&db, &create("Plan trip", &["a@x.com"]))
            .await
            .unwrap();

        let updated = SharedTask::update(
            &db,
            task.id,
            &UpdateSharedTask {
                shared_with: Some(vec![]),
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(updated.shared_with.is_empty());
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.task_title, "Plan trip");
        assert_eq!(updated.created_by, "creator");
    }

    #[tokio::test]
    async fn find_all_is_unscoped_and_newest_first() {
        let db = setup_db().await;
        let older = SharedTask::create(&db, &create("older", &[])).await.unwrap();
        let mut other = create("newer", &["x@y.z"]);
        other.created_by = "someone-else".to_string();
        let newer = SharedTask::create(&db, &other).await.unwrap();

        let all = SharedTask::find_all(&db, Order::Desc).await.unwrap();
        let ids: Vec<Uuid> = all.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn missing_shared_task_is_reported() {
        let db = setup_db().await;
        let err = SharedTask::update(&db, Uuid::new_v4(), &UpdateSharedTask::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
        assert_eq!(SharedTask::delete(&db, Uuid::new_v4()).await.unwrap(), 0);
    }
}
