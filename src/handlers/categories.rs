use axum::extract::{Json, Path, Query};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::{Category, CategoryNode};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::category_service::{CreateCategory, UpdateCategory};
use crate::services::CategoryService;

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    /// Return only the top level, without nested children
    #[serde(default)]
    pub roots_only: bool,
}

/// GET /api/categories/tree - nested tree of active categories
pub async fn tree(Query(query): Query<TreeQuery>) -> ApiResult<Vec<CategoryNode>> {
    let service = CategoryService::new().await?;
    let forest = service.tree(query.roots_only).await?;
    Ok(ApiResponse::success(forest))
}

/// GET /api/categories - flat list of active categories
pub async fn find_all() -> ApiResult<Vec<Category>> {
    let service = CategoryService::new().await?;
    let categories = service.find_all().await?;
    Ok(ApiResponse::success(categories))
}

/// GET /api/categories/:id - one category, active or not
pub async fn find_one(Path(id): Path<Uuid>) -> ApiResult<Category> {
    let service = CategoryService::new().await?;
    let category = service.find_one(id).await?;
    Ok(ApiResponse::success(category))
}

/// POST /api/categories - create a category
pub async fn create(Json(data): Json<CreateCategory>) -> ApiResult<Category> {
    let service = CategoryService::new().await?;
    let category = service.create(data).await?;
    Ok(ApiResponse::created(category))
}

/// PUT /api/categories/:id - update a category, including reparenting
pub async fn update(Path(id): Path<Uuid>, Json(data): Json<UpdateCategory>) -> ApiResult<Category> {
    let service = CategoryService::new().await?;
    let category = service.update(id, data).await?;
    Ok(ApiResponse::success(category))
}

/// DELETE /api/categories/:id - soft delete (children stay active)
pub async fn remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let service = CategoryService::new().await?;
    service.soft_delete(id).await?;
    Ok(ApiResponse::success(Value::Null))
}
