use thiserror::Error;

use crate::store::StoreError;
use crate::users::generator::GenerationError;
use crate::users::password::HashError;

/// Why a seeding run ended without committing.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("uniqueness violation on {}: {message}", .constraint.as_deref().unwrap_or("<unknown constraint>"))]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Hash(#[from] HashError),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl SeedError {
    /// Short label used in log lines.
    pub fn category(&self) -> &'static str {
        match self {
            SeedError::UniqueViolation { .. } => "integrity",
            SeedError::Validation(_) => "validation",
            SeedError::Generation(_) => "generation",
            SeedError::Hash(_) => "hashing",
            SeedError::Unexpected(_) => "unexpected",
        }
    }
}

impl From<StoreError> for SeedError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation {
                constraint,
                message,
            } => SeedError::UniqueViolation {
                constraint,
                message,
            },
            StoreError::Rejected(message) => SeedError::Validation(message),
            StoreError::Database(e) => SeedError::Unexpected(e.to_string()),
        }
    }
}
