use std::collections::HashMap;

use async_trait::async_trait;
use course_core::model::{Module, ModuleId, Video};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_module_row, map_video_row, ser};
use crate::repository::{CatalogSource, StorageError};

impl SqliteRepository {
    /// Insert or replace a module and all of its videos.
    ///
    /// `position` fixes the module's place in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if any statement fails; the
    /// transaction is rolled back in that case.
    pub async fn upsert_module(&self, module: &Module, position: u32) -> Result<(), StorageError> {
        let mut tx = self.pool().begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO modules (
                id, position, title, level, style, instructor, description,
                thumbnail, video_count, duration_secs
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                position = excluded.position,
                title = excluded.title,
                level = excluded.level,
                style = excluded.style,
                instructor = excluded.instructor,
                description = excluded.description,
                thumbnail = excluded.thumbnail,
                video_count = excluded.video_count,
                duration_secs = excluded.duration_secs
            ",
        )
        .bind(module.id().as_str())
        .bind(i64::from(position))
        .bind(module.title())
        .bind(module.level().as_str())
        .bind(module.style())
        .bind(module.instructor())
        .bind(module.description())
        .bind(module.thumbnail().map(ToString::to_string))
        .bind(i64::from(module.video_count()))
        .bind(i64::from(module.duration_secs()))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM videos WHERE module_id = ?1")
            .bind(module.id().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for video in module.videos() {
            sqlx::query(
                r"
                INSERT INTO videos (
                    id, module_id, title, media_uri, duration_secs, sort_order, level, description
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(video.id().as_str())
            .bind(video.module_id().as_str())
            .bind(video.title())
            .bind(video.media().to_string())
            .bind(i64::from(video.duration_secs()))
            .bind(i64::from(video.order()))
            .bind(video.level().as_str())
            .bind(video.description())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    /// Number of modules stored in the catalog tables.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the query fails.
    pub async fn module_count(&self) -> Result<u32, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM modules")
            .fetch_one(self.pool())
            .await
            .map_err(conn)?;
        let n: i64 = row.try_get("n").map_err(ser)?;
        super::mapping::i64_to_u32("module_count", n)
    }
}

#[async_trait]
impl CatalogSource for SqliteRepository {
    async fn fetch_modules(&self) -> Result<Vec<Module>, StorageError> {
        let module_rows = sqlx::query(
            r"
            SELECT id, title, level, style, instructor, description, thumbnail,
                   video_count, duration_secs
            FROM modules
            ORDER BY position ASC, id ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let video_rows = sqlx::query(
            r"
            SELECT id, module_id, title, media_uri, duration_secs, sort_order, level, description
            FROM videos
            ORDER BY module_id ASC, sort_order ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut by_module: HashMap<ModuleId, Vec<Video>> = HashMap::new();
        for row in &video_rows {
            let video = map_video_row(row)?;
            by_module
                .entry(video.module_id().clone())
                .or_default()
                .push(video);
        }

        let mut modules = Vec::with_capacity(module_rows.len());
        for row in &module_rows {
            let mut draft = map_module_row(row)?;
            draft.videos = by_module.remove(&draft.id).unwrap_or_default();
            modules.push(draft.validate().map_err(ser)?);
        }
        Ok(modules)
    }
}
