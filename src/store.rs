use async_trait::async_trait;
use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::config::Settings;
use crate::users::repo_types::{ExistingKeys, NewUser};

/// PostgreSQL `string_data_right_truncation`.
const VALUE_TOO_LONG: &str = "22001";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint {} violated: {message}", .constraint.as_deref().unwrap_or("<unknown>"))]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("row rejected by the database: {0}")]
    Rejected(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            match db.kind() {
                ErrorKind::UniqueViolation => {
                    return StoreError::UniqueViolation {
                        constraint: db.constraint().map(str::to_owned),
                        message: db.message().to_owned(),
                    }
                }
                ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                    return StoreError::Rejected(db.message().to_owned())
                }
                _ => {}
            }
            if db.code().as_deref() == Some(VALUE_TOO_LONG) {
                return StoreError::Rejected(db.message().to_owned());
            }
        }
        StoreError::Database(err)
    }
}

/// The seeder's view of the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates the table if it does not exist yet. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), StoreError>;
    async fn begin(&self) -> Result<Box<dyn UserTx>, StoreError>;
    async fn close(&self);
}

/// One open transaction. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait UserTx: Send {
    async fn existing_keys(&mut self) -> Result<ExistingKeys, StoreError>;
    async fn insert_batch(&mut self, users: &[NewUser]) -> Result<u64, StoreError>;
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

/// Opens a store from validated settings.
#[async_trait]
pub trait Connect: Send + Sync {
    async fn connect(&self, settings: &Settings) -> anyhow::Result<Box<dyn UserStore>>;
}
