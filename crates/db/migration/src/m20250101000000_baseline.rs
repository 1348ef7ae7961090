use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(ColumnDef::new(Tasks::OwnerId).string().not_null())
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(ColumnDef::new(Tasks::DueDate).timestamp())
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_uuid")
                    .table(Tasks::Table)
                    .col(Tasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(SharedTasks::Table)
                    .col(pk_id_col(manager, SharedTasks::Id))
                    .col(uuid_col(SharedTasks::Uuid))
                    .col(ColumnDef::new(SharedTasks::TaskTitle).string().not_null())
                    .col(ColumnDef::new(SharedTasks::TaskDescription).text())
                    .col(
                        ColumnDef::new(SharedTasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(ColumnDef::new(SharedTasks::CreatedBy).string().not_null())
                    .col(ColumnDef::new(SharedTasks::SharedWith).json().not_null())
                    .col(timestamp_col(SharedTasks::CreatedAt))
                    .col(timestamp_col(SharedTasks::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_shared_tasks_uuid")
                    .table(SharedTasks::Table)
                    .col(SharedTasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SharedTasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks::Table).to_owned())
            .await?;
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Uuid,
    OwnerId,
    Title,
    Description,
    Status,
    DueDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum SharedTasks {
    Table,
    Id,
    Uuid,
    TaskTitle,
    TaskDescription,
    Status,
    CreatedBy,
    SharedWith,
    CreatedAt,
    UpdatedAt,
}
