//! # Asset Repository
//!
//! Metadata records for promoted processed assets. The binary itself lives in
//! the object store directory; this table only holds the pointer and settings.

use super::models::{AssetForCreate, AssetRecord};
use super::DbPool;
use sqlx::query_as;

/// Asset repository for database operations.
pub struct AssetRepository;

impl AssetRepository {
    /// Insert a new asset metadata record.
    pub async fn create(pool: &DbPool, asset: AssetForCreate) -> Result<AssetRecord, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO assets (user_id, kind, url, settings, width, height)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(asset.user_id)
        .bind(&asset.kind)
        .bind(&asset.url)
        .bind(&asset.settings)
        .bind(asset.width)
        .bind(asset.height)
        .execute(pool)
        .await?;

        query_as::<_, AssetRecord>("SELECT * FROM assets WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(pool)
            .await
    }

    /// List a user's assets, newest first.
    pub async fn list_for_user(
        pool: &DbPool,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<AssetRecord>, sqlx::Error> {
        query_as::<_, AssetRecord>(
            "SELECT * FROM assets WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }
}
