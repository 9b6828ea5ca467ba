//! Database module
//!
//! This module provides all database functionality including:
//! - Connection lifecycle (`ConnectionProvider`)
//! - Schema and migrations
//! - Seed data
//! - Model definitions and result shaping
//! - Generic record store and entity repositories

pub mod models;
pub mod record;
pub mod repository;
pub mod schema;
pub mod seed;
pub mod shaping;

pub use models::*;
pub use record::{Fields, RecordStore, Table, Value};
pub use repository::Repositories;
pub use schema::initialize_database;

use crate::config::{DatabaseConfig, Storage, BUSY_TIMEOUT_SECS, MAX_POOL_CONNECTIONS};
use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

/// Build connection options shared by migration and application connections.
fn connect_options(db_path: &Path) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display())).map(
        |opts| {
            opts.create_if_missing(true)
                .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
                .journal_mode(SqliteJournalMode::Wal)
                .foreign_keys(true)
        },
    )
}

/// Create and initialize an on-disk connection pool.
///
/// Migrations run on a dedicated single-connection pool that is closed
/// before the application pool is created, so every pooled connection
/// sees the final schema.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Creating database connection pool at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(db_path)?)
        .await?;

    initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_POOL_CONNECTIONS)
        .connect_with(connect_options(db_path)?)
        .await?;

    tracing::info!("Database pool created successfully");

    Ok(pool)
}

/// Create and initialize an in-memory pool.
///
/// Each SQLite in-memory connection is its own database, so the pool holds
/// exactly one connection that is never recycled.
pub async fn create_memory_pool() -> Result<SqlitePool> {
    tracing::info!("Creating in-memory database");

    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    initialize_database(&pool).await?;

    Ok(pool)
}

/// Open the configured store, apply the schema and seed it.
pub async fn open_pool(config: &DatabaseConfig) -> Result<SqlitePool> {
    let pool = match &config.storage {
        Storage::File(path) => create_pool(path).await?,
        Storage::InMemory => create_memory_pool().await?,
    };

    seed::seed_database(&pool, config.seed_samples).await?;

    Ok(pool)
}

/// Owns the catalog's database handle.
///
/// The handle is opened on first use and shared by cloning the pool into
/// repositories. `close` releases it; the next `handle` call starts over.
pub struct ConnectionProvider {
    config: DatabaseConfig,
    pool: Mutex<Option<SqlitePool>>,
}

impl ConnectionProvider {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get the shared handle, initializing the store if needed
    pub async fn handle(&self) -> Result<SqlitePool> {
        let mut guard = self.pool.lock().await;

        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = open_pool(&self.config).await?;
        *guard = Some(pool.clone());

        Ok(pool)
    }

    pub async fn is_open(&self) -> bool {
        self.pool.lock().await.is_some()
    }

    /// Close the handle. Pools previously handed out become unusable.
    pub async fn close(&self) {
        let pool = self.pool.lock().await.take();

        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!("Database connection closed");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Seeded in-memory store without sample cocktails
    pub async fn memory_pool() -> SqlitePool {
        open_pool(&DatabaseConfig::in_memory().with_samples(false))
            .await
            .unwrap()
    }

    /// Seeded in-memory store including sample cocktails
    pub async fn sample_pool() -> SqlitePool {
        open_pool(&DatabaseConfig::in_memory()).await.unwrap()
    }
}
