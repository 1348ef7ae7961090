use std::time::Duration;

pub use sea_orm::{DatabaseConnection, DbErr};
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use utils_core::assets::asset_dir;

pub mod entities;
pub mod events;
pub mod models;
mod retry;
pub mod types;

#[derive(Clone)]
pub struct DBService {
    pub pool: DatabaseConnection,
}

pub fn default_database_url() -> String {
    format!(
        "sqlite://{}?mode=rwc",
        asset_dir().join("db.sqlite").to_string_lossy()
    )
}

impl DBService {
    /// Connects to `database_url` and brings the schema up to date.
    pub async fn connect(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options
            .connect_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        let pool = Database::connect(options).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::info!("Database ready");
        Ok(DBService { pool })
    }
}
