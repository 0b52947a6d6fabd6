use axum::extract::{Json, Path, Query};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::database::models::PriceRecord;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::pricing_service::UpsertPriceRecord;
use crate::services::PricingService;

#[derive(Debug, Deserialize)]
pub struct CurrentPriceQuery {
    /// Resolve as of this instant instead of now (RFC 3339)
    pub as_of: Option<DateTime<Utc>>,
}

/// GET /api/pricing/product/:productId - full price history
pub async fn find_by_product(Path(product_id): Path<Uuid>) -> ApiResult<Vec<PriceRecord>> {
    let service = PricingService::new().await?;
    let records = service.list_history(product_id).await?;
    Ok(ApiResponse::success(records))
}

/// GET /api/pricing/product/:productId/current - the applicable price,
/// or null when no active record's window contains the instant
pub async fn current(
    Path(product_id): Path<Uuid>,
    Query(query): Query<CurrentPriceQuery>,
) -> ApiResult<Option<PriceRecord>> {
    let service = PricingService::new().await?;
    let record = service.resolve_current(product_id, query.as_of).await?;
    Ok(ApiResponse::success(record))
}

/// POST /api/pricing - insert a price record, retiring the previous active
/// record of the same type
pub async fn upsert(Json(data): Json<UpsertPriceRecord>) -> ApiResult<PriceRecord> {
    let service = PricingService::new().await?;
    let record = service.upsert(data).await?;
    Ok(ApiResponse::created(record))
}

/// DELETE /api/pricing/:id - hard-delete one historical record
pub async fn remove(Path(id): Path<Uuid>) -> ApiResult<Value> {
    let service = PricingService::new().await?;
    service.remove(id).await?;
    Ok(ApiResponse::success(Value::Null))
}
