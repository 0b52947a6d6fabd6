use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Attribute, AttributeType, ProductAttribute, ProductAttributeValue};
use crate::database::DatabaseManager;
use crate::services::error::{is_foreign_key_violation, is_unique_violation, ServiceError};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttribute {
    pub name: String,
    pub code: String,
    /// Raw type string; parsed against the closed AttributeType set.
    pub attribute_type: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub allowed_values: Option<Vec<String>>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_filterable: bool,
    #[serde(default = "default_true")]
    pub is_searchable: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAttribute {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub allowed_values: Option<Vec<String>>,
    pub is_required: Option<bool>,
    pub is_filterable: Option<bool>,
    pub is_searchable: Option<bool>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

fn default_true() -> bool {
    true
}

/// Attribute definitions and per-product attribute values.
pub struct AttributeService {
    pool: PgPool,
}

impl AttributeService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    pub async fn find_all(&self) -> Result<Vec<Attribute>, ServiceError> {
        let attributes = sqlx::query_as::<_, Attribute>(
            "SELECT * FROM attributes WHERE is_active = TRUE ORDER BY sort_order ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(attributes)
    }

    pub async fn find_one(&self, id: Uuid) -> Result<Attribute, ServiceError> {
        sqlx::query_as::<_, Attribute>("SELECT * FROM attributes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Attribute"))
    }

    pub async fn create(&self, data: CreateAttribute) -> Result<Attribute, ServiceError> {
        info!("Creating attribute: {}", data.name);

        if data.name.trim().is_empty() {
            return Err(ServiceError::validation("name cannot be empty"));
        }
        if data.code.trim().is_empty() {
            return Err(ServiceError::validation("code cannot be empty"));
        }
        let attribute_type = data
            .attribute_type
            .parse::<AttributeType>()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        let attribute = sqlx::query_as::<_, Attribute>(
            r#"
            INSERT INTO attributes
                (name, code, attribute_type, unit, allowed_values, is_required,
                 is_filterable, is_searchable, sort_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.code.trim())
        .bind(attribute_type)
        .bind(&data.unit)
        .bind(data.allowed_values.map(Json))
        .bind(data.is_required)
        .bind(data.is_filterable)
        .bind(data.is_searchable)
        .bind(data.sort_order)
        .bind(data.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::conflict(format!("code '{}' is already in use", data.code.trim()))
            } else {
                e.into()
            }
        })?;

        Ok(attribute)
    }

    /// Update an attribute definition. The code and the value type are fixed
    /// at creation; stored product values would silently change meaning
    /// otherwise.
    pub async fn update(&self, id: Uuid, data: UpdateAttribute) -> Result<Attribute, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let current =
            sqlx::query_as::<_, Attribute>("SELECT * FROM attributes WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ServiceError::not_found("Attribute"))?;

        let name = match data.name {
            Some(name) => {
                if name.trim().is_empty() {
                    return Err(ServiceError::validation("name cannot be empty"));
                }
                name.trim().to_string()
            }
            None => current.name.clone(),
        };

        let attribute = sqlx::query_as::<_, Attribute>(
            r#"
            UPDATE attributes
            SET name = $1, unit = $2, allowed_values = $3, is_required = $4,
                is_filterable = $5, is_searchable = $6, sort_order = $7,
                is_active = $8, updated_at = now()
            WHERE id = $9
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(data.unit.or(current.unit))
        .bind(data.allowed_values.map(Json).or(current.allowed_values))
        .bind(data.is_required.unwrap_or(current.is_required))
        .bind(data.is_filterable.unwrap_or(current.is_filterable))
        .bind(data.is_searchable.unwrap_or(current.is_searchable))
        .bind(data.sort_order.unwrap_or(current.sort_order))
        .bind(data.is_active.unwrap_or(current.is_active))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(attribute)
    }

    /// Set (insert or overwrite) a product's value for an attribute. The
    /// value is checked against the attribute's type and allowed values
    /// before it is stored.
    pub async fn set_product_attribute(
        &self,
        product_id: Uuid,
        attribute_id: Uuid,
        value: String,
    ) -> Result<ProductAttribute, ServiceError> {
        let attribute = self.find_one(attribute_id).await?;

        let allowed = attribute.allowed_values.as_ref().map(|v| v.0.as_slice());
        attribute
            .attribute_type
            .validate_value(&value, allowed)
            .map_err(ServiceError::Validation)?;

        let stored = sqlx::query_as::<_, ProductAttribute>(
            r#"
            INSERT INTO product_attributes (product_id, attribute_id, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (product_id, attribute_id)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(attribute_id)
        .bind(&value)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ServiceError::not_found("Product")
            } else {
                e.into()
            }
        })?;

        Ok(stored)
    }

    /// All attribute values of a product, joined with their definitions
    pub async fn product_attributes(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<ProductAttributeValue>, ServiceError> {
        let values = sqlx::query_as::<_, ProductAttributeValue>(
            r#"
            SELECT pa.id, pa.attribute_id, a.code, a.name, a.attribute_type, a.unit, pa.value
            FROM product_attributes pa
            INNER JOIN attributes a ON a.id = pa.attribute_id
            WHERE pa.product_id = $1
            ORDER BY a.sort_order ASC
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }
}
