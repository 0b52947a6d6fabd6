use axum::extract::{Json, Path};
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::Media;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::media_service::{CreateMedia, UpdateMedia};
use crate::services::MediaService;

/// GET /api/media/product/:productId - gallery for a product
pub async fn find_by_product(Path(product_id): Path<Uuid>) -> ApiResult<Vec<Media>> {
    let service = MediaService::new().await?;
    let media = service.find_by_product(product_id).await?;
    Ok(ApiResponse::success(media))
}

/// POST /api/media - attach a media asset to a product
pub async fn create(Json(data): Json<CreateMedia>) -> ApiResult<Media> {
    let service = MediaService::new().await?;
    let media = service.create(data).await?;
    Ok(ApiResponse::created(media))
}

/// PUT /api/media/:id - update a media asset
pub async fn update(Path(id): Path<Uuid>, Json(data): Json<UpdateMedia>) -> ApiResult<Media> {
    let service = MediaService::new().await?;
    let media = service.update(id, data).await?;
    Ok(ApiResponse::success(media))
}

/// PUT /api/media/:id/primary - make this the product's primary asset
pub async fn set_primary(Path(id): Path<Uuid>) -> ApiResult<Media> {
    let service = MediaService::new().await?;
    let media = service.set_primary(id).await?;
    Ok(ApiResponse::success(media))
}

/// DELETE /api/media/:id - remove a media asset
pub async fn remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let service = MediaService::new().await?;
    service.remove(id).await?;
    Ok(ApiResponse::success(Value::Null))
}
