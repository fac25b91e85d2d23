//! # Asset Storage
//!
//! Persists promoted tool results: the PNG bytes land in the local asset
//! store directory under a generated name, and a metadata record lands in
//! the database. Tool runs themselves never touch this service; promotion
//! is an explicit client request.

use lib_core::model::store::models::{AssetForCreate, AssetRecord};
use lib_core::model::store::AssetRepository;
use lib_core::{AppError, DbPool};
use tracing::{debug, info};
use uuid::Uuid;

/// Local-directory asset store plus metadata records.
#[derive(Clone)]
pub struct AssetService {
    store_dir: String,
}

impl AssetService {
    pub fn new(store_dir: String) -> Self {
        Self { store_dir }
    }

    /// Persist a PNG and its metadata record.
    ///
    /// The stored file name is a generated UUID, so saving the same image
    /// twice yields two independent assets.
    pub async fn save_png(
        &self,
        pool: &DbPool,
        user_id: i64,
        kind: &str,
        settings: &serde_json::Value,
        png: &[u8],
        width: u32,
        height: u32,
    ) -> Result<AssetRecord, AppError> {
        let file_name = format!("{}.png", Uuid::new_v4());
        let file_path = std::path::Path::new(&self.store_dir).join(&file_name);

        tokio::fs::create_dir_all(&self.store_dir)
            .await
            .map_err(|e| AppError::Upload(format!("Asset store dir: {}", e)))?;
        tokio::fs::write(&file_path, png)
            .await
            .map_err(|e| AppError::Upload(format!("Asset write: {}", e)))?;

        debug!(?file_path, bytes = png.len(), "[ASSETS] PNG written");

        let record = AssetRepository::create(
            pool,
            AssetForCreate {
                user_id,
                kind: kind.to_string(),
                url: format!("/assets/{}", file_name),
                settings: settings.to_string(),
                width: width as i64,
                height: height as i64,
            },
        )
        .await
        .map_err(|e| AppError::Upload(format!("Asset record: {}", e)))?;

        info!(
            user_id,
            asset_id = record.id,
            kind,
            url = %record.url,
            "[ASSETS] Asset saved"
        );

        Ok(record)
    }

    /// Read a stored asset file back by its bare file name.
    ///
    /// Rejects names with path separators so a crafted URL cannot escape the
    /// store directory.
    pub async fn read_file(&self, file_name: &str) -> Result<Vec<u8>, AppError> {
        if file_name.contains('/') || file_name.contains('\\') || file_name.contains("..") {
            return Err(AppError::InvalidInput("Invalid asset name".to_string()));
        }

        let file_path = std::path::Path::new(&self.store_dir).join(file_name);
        tokio::fs::read(&file_path)
            .await
            .map_err(|_| AppError::NotFound(format!("Asset {} not found", file_name)))
    }
}
