use axum::extract::{Json, Path, Query};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::product::ProductPage;
use crate::database::models::{Category, Product, ProductDetail};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::product_service::{CreateProduct, ProductQuery, UpdateProduct};
use crate::services::ProductService;

#[derive(Debug, Deserialize)]
pub struct AssignCategories {
    pub category_ids: Vec<Uuid>,
}

/// GET /api/products - paginated listing with search and filters
pub async fn find_all(Query(query): Query<ProductQuery>) -> ApiResult<ProductPage> {
    let service = ProductService::new().await?;
    let page = service.find_all(query).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/products - create a product
pub async fn create(Json(data): Json<CreateProduct>) -> ApiResult<Product> {
    let service = ProductService::new().await?;
    let product = service.create(data).await?;
    Ok(ApiResponse::created(product))
}

/// GET /api/products/:id - product with categories, attributes, media, pricing
pub async fn find_one(Path(id): Path<Uuid>) -> ApiResult<ProductDetail> {
    let service = ProductService::new().await?;
    let detail = service.find_one(id).await?;
    Ok(ApiResponse::success(detail))
}

/// GET /api/products/sku/:sku - lookup by SKU
pub async fn find_by_sku(Path(sku): Path<String>) -> ApiResult<ProductDetail> {
    let service = ProductService::new().await?;
    let detail = service.find_by_sku(&sku).await?;
    Ok(ApiResponse::success(detail))
}

/// PUT /api/products/:id - update a product
pub async fn update(Path(id): Path<Uuid>, Json(data): Json<UpdateProduct>) -> ApiResult<Product> {
    let service = ProductService::new().await?;
    let product = service.update(id, data).await?;
    Ok(ApiResponse::success(product))
}

/// PUT /api/products/:id/categories - replace category assignments
pub async fn assign_categories(
    Path(id): Path<Uuid>,
    Json(data): Json<AssignCategories>,
) -> ApiResult<Vec<Category>> {
    let service = ProductService::new().await?;
    let categories = service.assign_categories(id, data.category_ids).await?;
    Ok(ApiResponse::success(categories))
}

/// DELETE /api/products/:id - soft delete
pub async fn remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let service = ProductService::new().await?;
    service.remove(id).await?;
    Ok(ApiResponse::success(Value::Null))
}

/// DELETE /api/products/:id/hard - hard delete with cascades
pub async fn hard_remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let service = ProductService::new().await?;
    service.hard_remove(id).await?;
    Ok(ApiResponse::success(Value::Null))
}
