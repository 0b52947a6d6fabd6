use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::attribute::ProductAttributeValue;
use super::category::{Category, SeoData};
use super::media::Media;
use super::pricing::PriceRecord;

/// Physical dimensions stored as jsonb, all in centimeters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<Decimal>,
}

/// Central product row; every sales channel references this catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub title: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub ean: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub dimensions_cm: Option<Json<Dimensions>>,
    pub is_active: bool,
    pub seo_data: Option<Json<SeoData>>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product plus its related catalog data, as served by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub categories: Vec<Category>,
    pub attributes: Vec<ProductAttributeValue>,
    pub media: Vec<Media>,
    pub pricing: Vec<PriceRecord>,
}

/// One page of a product listing.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub items: Vec<Product>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}
