use axum::extract::{Json, Path};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Attribute, ProductAttribute, ProductAttributeValue};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::attribute_service::{CreateAttribute, UpdateAttribute};
use crate::services::AttributeService;

#[derive(Debug, Deserialize)]
pub struct SetAttributeValue {
    pub value: String,
}

/// GET /api/attributes - active attribute definitions
pub async fn find_all() -> ApiResult<Vec<Attribute>> {
    let service = AttributeService::new().await?;
    let attributes = service.find_all().await?;
    Ok(ApiResponse::success(attributes))
}

/// GET /api/attributes/:id - one attribute definition
pub async fn find_one(Path(id): Path<Uuid>) -> ApiResult<Attribute> {
    let service = AttributeService::new().await?;
    let attribute = service.find_one(id).await?;
    Ok(ApiResponse::success(attribute))
}

/// POST /api/attributes - create an attribute definition
pub async fn create(Json(data): Json<CreateAttribute>) -> ApiResult<Attribute> {
    let service = AttributeService::new().await?;
    let attribute = service.create(data).await?;
    Ok(ApiResponse::created(attribute))
}

/// PUT /api/attributes/:id - update an attribute definition
pub async fn update(Path(id): Path<Uuid>, Json(data): Json<UpdateAttribute>) -> ApiResult<Attribute> {
    let service = AttributeService::new().await?;
    let attribute = service.update(id, data).await?;
    Ok(ApiResponse::success(attribute))
}

/// GET /api/attributes/product/:productId - a product's attribute values
pub async fn product_attributes(
    Path(product_id): Path<Uuid>,
) -> ApiResult<Vec<ProductAttributeValue>> {
    let service = AttributeService::new().await?;
    let values = service.product_attributes(product_id).await?;
    Ok(ApiResponse::success(values))
}

/// PUT /api/attributes/product/:productId/:attributeId - set a product's
/// value for an attribute; the value is validated against the attribute type
pub async fn set_product_attribute(
    Path((product_id, attribute_id)): Path<(Uuid, Uuid)>,
    Json(data): Json<SetAttributeValue>,
) -> ApiResult<ProductAttribute> {
    let service = AttributeService::new().await?;
    let stored = service
        .set_product_attribute(product_id, attribute_id, data.value)
        .await?;
    Ok(ApiResponse::success(stored))
}
