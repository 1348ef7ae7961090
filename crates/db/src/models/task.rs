use chrono::{DateTime, Utc};
use sea_orm::sea_query::Order;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::TaskStatus;
use crate::{
    entities::task,
    events::{EVENT_TASK_CREATED, EVENT_TASK_DELETED, EVENT_TASK_UPDATED},
    models::{double_option, normalize_text},
    retry::retry_on_sqlite_busy,
};

/// A personal task, visible only to its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTask {
    pub fn from_title_description(
        owner_id: String,
        title: String,
        description: Option<String>,
    ) -> Self {
        Self {
            owner_id,
            title,
            description,
            status: Some(TaskStatus::Pending),
            due_date: None,
        }
    }
}

/// Partial update. `None` keeps the stored value; an empty description
/// clears it, as does `Some(None)` for the due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTask {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Task {
    fn from_model(model: task::Model) -> Self {
        Self {
            id: model.uuid,
            owner_id: model.owner_id,
            title: model.title,
            description: model.description,
            status: model.status,
            due_date: model.due_date.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_by_owner<C: ConnectionTrait>(
        db: &C,
        owner_id: &str,
        order: Order,
    ) -> Result<Vec<Self>, DbErr> {
        let models = task::Entity::find()
            .filter(task::Column::OwnerId.eq(owner_id))
            .order_by(task::Column::CreatedAt, order.clone())
            .order_by(task::Column::Id, order)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateTask) -> Result<Self, DbErr> {
        let title = data.title.trim();
        if title.is_empty() {
            return Err(DbErr::Custom("Task title cannot be empty".to_string()));
        }

        let task_id = Uuid::new_v4();
        let model = retry_on_sqlite_busy(|| {
            let now = Utc::now();
            let active = task::ActiveModel {
                uuid: Set(task_id),
                owner_id: Set(data.owner_id.clone()),
                title: Set(title.to_string()),
                description: Set(normalize_text(data.description.as_deref())),
                status: Set(data.status.unwrap_or_default()),
                due_date: Set(data.due_date.map(Into::into)),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
                ..Default::default()
            };
            active.insert(db)
        })
        .await?;

        tracing::debug!(event = EVENT_TASK_CREATED, task_id = %task_id, "Task persisted");
        Ok(Self::from_model(model))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, DbErr> {
        let record = task::Entity::find()
            .filter(task::Column::Uuid.eq(id))
            .one(db)
            .await?
            .ok_or(DbErr::RecordNotFound("Task not found".to_string()))?;

        let mut active: task::ActiveModel = record.into();
        if let Some(title) = data.title.as_deref() {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = data.description.as_deref() {
            active.description = Set(normalize_text(Some(description)));
        }
        if let Some(status) = data.status {
            active.status = Set(status);
        }
        if let Some(due_date) = data.due_date {
            active.due_date = Set(due_date.map(Into::into));
        }
        active.updated_at = Set(Utc::now().into());

        let updated = retry_on_sqlite_busy(|| active.clone().update(db)).await?;
        tracing::debug!(event = EVENT_TASK_UPDATED, task_id = %id, "Task persisted");
        Ok(Self::from_model(updated))
    }

    pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
        let result = retry_on_sqlite_busy(|| {
            task::Entity::delete_many()
                .filter(task::Column::Uuid.eq(id))
                .exec(db)
        })
        .await?;

        if result.rows_affected > 0 {
            tracing::debug!(event = EVENT_TASK_DELETED, task_id = %id, "Task removed");
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

    fn create(owner: &str, title: &str) -> CreateTask {
        CreateTask::from_title_description(owner.to_string(), title.to_string(), None)
    }

    #[tokio::test]
    async fn create_assigns_id_and_normalizes_fields() {
        let db = setup_db().await;

        let mut data = create("user-1", "  Buy milk  ");
        data.description = Some("   ".to_string());
        let task = Task::create(&db, &data).await.unwrap();

        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, None);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.owner_id, "user-1");

        let found = Task::find_by_id(&db, task.id).await.unwrap().unwrap();
        assert_eq!(found.id, task.id);
        assert_eq!(found.title, "Buy milk");
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let db = setup_db().await;
        let err = Task::create(&db, &create("user-1", "   ")).await.unwrap_err();
        assert!(matches!(err, DbErr::Custom(_)));
    }

    #[tokio::test]
    async fn find_by_owner_scopes_and_orders_newest_first() {
        let db = setup_db().await;

        let first = Task::create(&db, &create("user-1", "first")).await.unwrap();
        let second = Task::create(&db, &create("user-1", "second")).await.unwrap();
        Task::create(&db, &create("user-2", "someone else")).await.unwrap();

        let newest_first = Task::find_by_owner(&db, "user-1", Order::Desc).await.unwrap();
        let ids: Vec<Uuid> = newest_first.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let oldest_first = Task::find_by_owner(&db, "user-1", Order::Asc).await.unwrap();
        assert_eq!(oldest_first[0].id, first.id);
    }

    #[tokio::test]
    async fn update_applies_only_provided_fields() {
        let db = setup_db().await;
        let mut data = create("user-1", "Write report");
        data.description = Some("quarterly".to_string());
        let task = Task::create(&db, &data).await.unwrap();

        let updated = Task::update(&db, task.id, &UpdateTask::status(TaskStatus::Completed))
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "Write report");
        assert_eq!(updated.description.as_deref(), Some("quarterly"));
        assert_eq!(updated.owner_id, "user-1");

        let cleared = Task::update(
            &db,
            task.id,
            &UpdateTask {
                description: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.description, None);
    }

    #[tokio::test]
    async fn update_and_delete_report_missing_records() {
        let db = setup_db().await;

        let err = Task::update(&db, Uuid::new_v4(), &UpdateTask::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));

        assert_eq!(Task::delete(&db, Uuid::new_v4()).await.unwrap(), 0);

        let task = Task::create(&db, &create("user-1", "Temp")).await.unwrap();
        assert_eq!(Task::delete(&db, task.id).await.unwrap(), 1);
        assert!(Task::find_by_id(&db, task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn explicit_null_due_date_clears_it() {
        let db = setup_db().await;
        let mut data = create("user-1", "Pay rent");
        data.due_date = Some(Utc::now());
        let task = Task::create(&db, &data).await.unwrap();
        assert!(task.due_date.is_some());

        let untouched: UpdateTask = serde_json::from_str(r#"{ "title": "Pay rent!" }"#).unwrap();
        assert_eq!(untouched.due_date, None);
        let kept = Task::update(&db, task.id, &untouched).await.unwrap();
        assert!(kept.due_date.is_some());

        let clear: UpdateTask = serde_json::from_str(r#"{ "due_date": null }"#).unwrap();
        assert_eq!(clear.due_date, Some(None));
        let cleared = Task::update(&db, task.id, &clear).await.unwrap();
        assert_eq!(cleared.due_date, None);
        assert_eq!(cleared.title, "Pay rent!");
    }
}
