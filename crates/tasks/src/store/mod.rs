//! The remote store seen by the repositories: per-collection CRUD that can
//! fail or be slow.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{record::Record, session::UserId};

pub mod memory;
pub mod sql;

pub use self::{memory::MemoryStore, sql::DbStore};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(Uuid),
    #[error("{0}")]
    Backend(String),
}

/// Row filter for `select`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Owner(UserId),
    /// Records the user created or collaborates on.
    Participant(UserId),
    Unscoped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[async_trait]
pub trait RemoteStore<R: Record>: Send + Sync {
    async fn select(&self, scope: &Scope, order: SortOrder) -> Result<Vec<R>, StoreError>;

    async fn insert(&self, draft: R::Draft) -> Result<R, StoreError>;

    async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}
