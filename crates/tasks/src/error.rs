use thiserror::Error;
use uuid::Uuid;

use crate::{record::RecordKind, session::SessionError, store::StoreError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Task title cannot be empty")]
    EmptyTitle,
    #[error("No user is signed in")]
    NoSession,
    #[error("{} {id} not found", kind.label())]
    NotFound { kind: RecordKind, id: Uuid },
    #[error("Remote store error: {0}")]
    Remote(String),
}

impl RepositoryError {
    pub fn from_store(kind: RecordKind, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound { kind, id },
            StoreError::Backend(message) => Self::Remote(message),
        }
    }
}

impl From<SessionError> for RepositoryError {
    fn from(_: SessionError) -> Self {
        Self::NoSession
    }
}

/// Trims `title`, rejecting blank input.
pub fn validate_title(title: &str) -> Result<String, RepositoryError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_the_record_kind() {
        let id = Uuid::new_v4();
        let err = RepositoryError::from_store(RecordKind::Shared, StoreError::NotFound(id));
        assert_eq!(
            err,
            RepositoryError::NotFound {
                kind: RecordKind::Shared,
                id
            }
        );
        assert_eq!(err.to_string(), format!("Shared task {id} not found"));
    }

    #[test]
    fn titles_are_trimmed_and_required() {
        assert_eq!(validate_title("  Buy milk "), Ok("Buy milk".to_string()));
        assert_eq!(validate_title(" \t"), Err(RepositoryError::EmptyTitle));
    }
}
