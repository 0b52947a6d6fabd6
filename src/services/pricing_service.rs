use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::models::pricing::pick_current;
use crate::database::models::{PriceRecord, PriceType};
use crate::database::DatabaseManager;
use crate::services::error::{is_foreign_key_violation, ServiceError};

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertPriceRecord {
    pub product_id: Uuid,
    pub base_price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub cost_price: Option<Decimal>,
    #[serde(default)]
    pub margin_percent: Option<Decimal>,
    #[serde(default)]
    pub sale_price: Option<Decimal>,
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Raw type string; parsed against the closed PriceType set. Defaults
    /// to "regular".
    #[serde(default)]
    pub price_type: Option<String>,
}

fn default_currency() -> String {
    "CZK".to_string()
}

fn default_true() -> bool {
    true
}

/// Maintains price history and answers "what price applies right now".
///
/// Records only ever move between active and inactive. The upsert keeps the
/// single-active invariant per (product_id, price_type) by deactivating the
/// previous active record and inserting the new row inside one transaction;
/// validity windows are advisory and only consulted at resolution time.
pub struct PricingService {
    pool: PgPool,
}

impl PricingService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    /// Insert a new price record, retiring the previous active record of the
    /// same type for the product. Existing rows are never modified in place;
    /// superseded records remain as history with `is_active = false`.
    pub async fn upsert(&self, data: UpsertPriceRecord) -> Result<PriceRecord, ServiceError> {
        info!("Upserting pricing for product: {}", data.product_id);

        let price_type = parse_price_type(data.price_type.as_deref())?;

        if data.base_price < Decimal::ZERO {
            return Err(ServiceError::validation("base_price cannot be negative"));
        }
        if let (Some(from), Some(to)) = (data.valid_from, data.valid_to) {
            if from > to {
                return Err(ServiceError::validation(
                    "valid_from must not be after valid_to",
                ));
            }
        }

        let mut tx = self.pool.begin().await?;

        if data.is_active {
            // Retire the current active record of this type, if any
            sqlx::query(
                r#"
                UPDATE price_records
                SET is_active = FALSE, updated_at = now()
                WHERE product_id = $1 AND price_type = $2 AND is_active = TRUE
                "#,
            )
            .bind(data.product_id)
            .bind(price_type)
            .execute(&mut *tx)
            .await?;
        }

        let record = sqlx::query_as::<_, PriceRecord>(
            r#"
            INSERT INTO price_records
                (product_id, base_price, currency, cost_price, margin_percent,
                 sale_price, valid_from, valid_to, is_active, price_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(data.product_id)
        .bind(data.base_price)
        .bind(&data.currency)
        .bind(data.cost_price)
        .bind(data.margin_percent)
        .bind(data.sale_price)
        .bind(data.valid_from)
        .bind(data.valid_to)
        .bind(data.is_active)
        .bind(price_type)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ServiceError::not_found("Product")
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(record)
    }

    /// The price applying at `as_of` (now when absent): the active, in-window
    /// record with the highest price-type priority, or none.
    pub async fn resolve_current(
        &self,
        product_id: Uuid,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Option<PriceRecord>, ServiceError> {
        let records = sqlx::query_as::<_, PriceRecord>(
            "SELECT * FROM price_records WHERE product_id = $1 AND is_active = TRUE",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pick_current(records, as_of.unwrap_or_else(Utc::now)))
    }

    /// Full price history for a product, newest validity first. Records
    /// without a start bound are valid "from the beginning of time" and
    /// sort last.
    pub async fn list_history(&self, product_id: Uuid) -> Result<Vec<PriceRecord>, ServiceError> {
        let records = sqlx::query_as::<_, PriceRecord>(
            r#"
            SELECT * FROM price_records
            WHERE product_id = $1
            ORDER BY valid_from DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Hard-delete one historical record
    pub async fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        info!("Deleting price record: {}", id);

        let affected = sqlx::query("DELETE FROM price_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(ServiceError::not_found("Price record"));
        }
        Ok(())
    }
}

fn parse_price_type(raw: Option<&str>) -> Result<PriceType, ServiceError> {
    match raw {
        None => Ok(PriceType::Regular),
        Some(s) => s
            .parse::<PriceType>()
            .map_err(|e| ServiceError::validation(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_type_defaults_to_regular() {
        assert_eq!(parse_price_type(None).unwrap(), PriceType::Regular);
        assert_eq!(parse_price_type(Some("sale")).unwrap(), PriceType::Sale);
    }

    #[test]
    fn unknown_price_type_is_a_validation_error() {
        let err = parse_price_type(Some("clearance")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
