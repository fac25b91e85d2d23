//! # Asset Handlers
//!
//! Explicit promotion of tool results to persistent storage, the user's
//! asset listing, and serving stored files back. Saving is free; the coins
//! were spent when the tool ran.

use crate::services::AssetService;
use axum::extract::{Extension, Json, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use lib_auth::Claims;
use lib_core::dto::SaveAssetRequest;
use lib_core::model::store::models::AssetRecord;
use lib_core::model::store::AssetRepository;
use lib_core::{AppError, DbPool, Result};
use lib_utils::{b64_decode, validate_not_empty};
use serde::Deserialize;
use tracing::{info, instrument};

const DEFAULT_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// `POST /api/assets` - promote a processed image to persistent storage.
#[instrument(skip(claims, pool, assets, req), fields(username = %claims.username, kind = %req.kind))]
pub async fn save_asset(
    Extension(claims): Extension<Claims>,
    State(pool): State<DbPool>,
    State(assets): State<AssetService>,
    Json(req): Json<SaveAssetRequest>,
) -> Result<(StatusCode, Json<AssetRecord>)> {
    let user_id = claims
        .user_id()
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    if let Err(e) = validate_not_empty(&req.kind, "Asset kind") {
        return Err(AppError::InvalidInput(e));
    }

    let png = b64_decode(&req.image)
        .map_err(|_| AppError::InvalidInput("Image is not valid base64".to_string()))?;

    let (width, height) = lib_tools::image::dimensions(&png)
        .map_err(|e| AppError::InvalidInput(format!("Not a decodable image: {}", e)))?;

    let record = assets
        .save_png(&pool, user_id, &req.kind, &req.settings, &png, width, height)
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /api/assets` - the authenticated user's saved assets, newest first.
pub async fn list_assets(
    Extension(claims): Extension<Claims>,
    State(pool): State<DbPool>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AssetRecord>>> {
    let user_id = claims
        .user_id()
        .map_err(|e| AppError::Unauthenticated(e.to_string()))?;

    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 200);
    let records = AssetRepository::list_for_user(&pool, user_id, limit).await?;

    info!(user_id, count = records.len(), "[ASSETS] Listed assets");
    Ok(Json(records))
}

/// `GET /assets/{file}` - serve a stored asset file.
pub async fn serve_asset(
    State(assets): State<AssetService>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse> {
    let bytes = assets.read_file(&file_name).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, setup_test_db, test_claims, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use lib_utils::b64_encode;
    use tower::ServiceExt;

    fn assets_router(pool: lib_core::DbPool) -> Router {
        Router::new()
            .route("/api/assets", get(list_assets).post(save_asset))
            .route("/assets/{file}", get(serve_asset))
            .with_state(test_state(pool))
    }

    fn png_fixture() -> Vec<u8> {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            5,
            7,
            image::Rgba([0, 0, 0, 255]),
        ));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_save_then_list_then_serve() {
        let pool = setup_test_db().await;
        let user_id = seed_user(&pool, "alice", 10).await;
        let app = assets_router(pool);

        let save = Request::builder()
            .method("POST")
            .uri("/api/assets")
            .header("content-type", "application/json")
            .extension(test_claims(user_id, "alice"))
            .body(Body::from(
                serde_json::json!({
                    "image": b64_encode(png_fixture()),
                    "kind": "resize",
                    "settings": {"scale": 1.5}
                })
                .to_string(),
            ))
            .unwrap();
        let res = app.clone().oneshot(save).await.unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let saved = body_json(res).await;
        assert_eq!(saved["width"], 5);
        assert_eq!(saved["height"], 7);
        let url = saved["url"].as_str().unwrap().to_string();

        let list = Request::builder()
            .uri("/api/assets")
            .extension(test_claims(user_id, "alice"))
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(list).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let listed = body_json(res).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let fetch = Request::builder().uri(url).body(Body::empty()).unwrap();
        let res = app.oneshot(fetch).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
    }

    #[tokio::test]
    async fn test_save_rejects_non_image_payload() {
        let pool = setup_test_db().await;
        let user_id = seed_user(&pool, "alice", 10).await;
        let app = assets_router(pool);

        let save = Request::builder()
            .method("POST")
            .uri("/api/assets")
            .header("content-type", "application/json")
            .extension(test_claims(user_id, "alice"))
            .body(Body::from(
                serde_json::json!({
                    "image": b64_encode(b"junk"),
                    "kind": "resize"
                })
                .to_string(),
            ))
            .unwrap();
        let res = app.oneshot(save).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
