use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::store::{StoreError, UserTx};
use crate::users::repo_types::{ExistingKeys, NewUser};

pub const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        first_name    VARCHAR(50)  NOT NULL,
        last_name     VARCHAR(50)  NOT NULL,
        email         VARCHAR(120) NOT NULL UNIQUE,
        username      VARCHAR(50)  NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        created_at    TIMESTAMPTZ  NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ  NOT NULL DEFAULT now()
    )
"#;

/// Rows per INSERT statement; 8 binds each keeps well under PostgreSQL's
/// 65535 parameter limit.
const ROWS_PER_STATEMENT: usize = 1_000;

/// Create the `users` table if it is missing.
pub async fn ensure_schema(db: &PgPool) -> Result<(), StoreError> {
    sqlx::query(CREATE_USERS_TABLE).execute(db).await?;
    Ok(())
}

pub struct PgUserTx {
    tx: Transaction<'static, Postgres>,
}

impl PgUserTx {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl UserTx for PgUserTx {
    /// Every email and username currently in the table.
    async fn existing_keys(&mut self) -> Result<ExistingKeys, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT email, username
            FROM users
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    /// Insert all rows inside the open transaction.
    async fn insert_batch(&mut self, users: &[NewUser]) -> Result<u64, StoreError> {
        let mut inserted = 0;
        for chunk in users.chunks(ROWS_PER_STATEMENT) {
            let mut query = QueryBuilder::<Postgres>::new(
                "INSERT INTO users (id, first_name, last_name, email, username, password_hash, created_at, updated_at) ",
            );
            query.push_values(chunk, |mut row, user| {
                row.push_bind(user.id)
                    .push_bind(user.first_name.as_str())
                    .push_bind(user.last_name.as_str())
                    .push_bind(user.email.as_str())
                    .push_bind(user.username.as_str())
                    .push_bind(user.password_hash.as_str())
                    .push_bind(user.created_at)
                    .push_bind(user.updated_at);
            });
            inserted += query.build().execute(&mut *self.tx).await?.rows_affected();
        }
        Ok(inserted)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
