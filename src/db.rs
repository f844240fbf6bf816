use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::Settings;
use crate::store::{Connect, StoreError, UserStore, UserTx};
use crate::users::repo::{self, PgUserTx};

/// PostgreSQL-backed store holding the run's single connection.
#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(settings.connect_options())
            .await
            .context("connect to database")?;
        Ok(Self::from_pool(db))
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        repo::ensure_schema(&self.db).await
    }

    async fn begin(&self) -> Result<Box<dyn UserTx>, StoreError> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgUserTx::new(tx)))
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

pub struct PgConnector;

#[async_trait]
impl Connect for PgConnector {
    async fn connect(&self, settings: &Settings) -> anyhow::Result<Box<dyn UserStore>> {
        let store = PgStore::connect(settings).await?;
        info!(host = %settings.db_host, port = settings.db_port, database = %settings.db_name, "connected");
        Ok(Box::new(store))
    }
}
