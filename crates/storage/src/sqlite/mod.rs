use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::builtin::BuiltinCatalog;
use crate::repository::{CatalogSource, KeyValueStore, Storage, StorageError};

mod catalog_repo;
mod kv_repo;
mod mapping;
mod migrate;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("bundled catalog is invalid: {0}")]
    Catalog(#[from] course_core::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// the connection pragmas fail.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }

    /// Write the bundled catalog when the catalog tables are empty.
    ///
    /// Returns `true` if rows were written.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the bundled data is invalid or cannot be
    /// stored.
    pub async fn seed_builtin_if_empty(&self) -> Result<bool, SqliteInitError> {
        if self.module_count().await? > 0 {
            return Ok(false);
        }
        let modules = BuiltinCatalog::modules()?;
        self.replace_catalog(&modules).await?;
        tracing::info!(modules = modules.len(), "seeded bundled catalog");
        Ok(true)
    }

    /// Upsert every module in order, positions starting at zero.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on the first module that fails to store.
    pub async fn replace_catalog(&self, modules: &[course_core::model::Module]) -> Result<(), StorageError> {
        for (position, module) in (0_u32..).zip(modules) {
            self.upsert_module(module, position).await?;
        }
        Ok(())
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite` for both snapshots and catalog.
    ///
    /// An empty catalog is seeded with the bundled modules.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        repo.seed_builtin_if_empty().await?;
        let kv: Arc<dyn KeyValueStore> = Arc::new(repo.clone());
        let catalog: Arc<dyn CatalogSource> = Arc::new(repo);
        Ok(Self { kv, catalog })
    }
}
