use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::config;
use crate::database::models::product::{Dimensions, ProductPage};
use crate::database::models::{
    Category, Media, PriceRecord, Product, ProductAttributeValue, ProductDetail, SeoData,
};
use crate::database::DatabaseManager;
use crate::services::error::{is_foreign_key_violation, is_unique_violation, ServiceError};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub sku: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub ean: Option<String>,
    #[serde(default)]
    pub weight_kg: Option<Decimal>,
    #[serde(default)]
    pub dimensions_cm: Option<Dimensions>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub seo_data: Option<SeoData>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub sku: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub ean: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub dimensions_cm: Option<Dimensions>,
    pub is_active: Option<bool>,
    pub seo_data: Option<SeoData>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub category_id: Option<Uuid>,
}

fn default_true() -> bool {
    true
}

/// CRUD over the central product catalog.
pub struct ProductService {
    pool: PgPool,
}

impl ProductService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    /// Create a new product
    pub async fn create(&self, data: CreateProduct) -> Result<Product, ServiceError> {
        info!("Creating product with SKU: {}", data.sku);

        if data.sku.trim().is_empty() {
            return Err(ServiceError::validation("SKU cannot be empty"));
        }
        if data.title.trim().is_empty() {
            return Err(ServiceError::validation("title cannot be empty"));
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products
                (sku, title, description, brand, manufacturer, ean, weight_kg,
                 dimensions_cm, is_active, seo_data, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(data.sku.trim())
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(&data.brand)
        .bind(&data.manufacturer)
        .bind(&data.ean)
        .bind(data.weight_kg)
        .bind(data.dimensions_cm.map(Json))
        .bind(data.is_active)
        .bind(data.seo_data.map(Json))
        .bind(&data.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::conflict(format!("SKU '{}' is already in use", data.sku.trim()))
            } else {
                e.into()
            }
        })?;

        Ok(product)
    }

    /// Paginated listing with optional search and filters.
    /// Search matches title, SKU and brand, case-insensitively.
    pub async fn find_all(&self, query: ProductQuery) -> Result<ProductPage, ServiceError> {
        let api = &config::config().api;
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(api.default_page_size)
            .clamp(1, api.max_page_size);
        let offset = (page - 1) * limit;

        let mut items_query = QueryBuilder::new("SELECT p.* FROM products p");
        push_filters(&mut items_query, &query);
        items_query.push(" ORDER BY p.created_at DESC LIMIT ");
        items_query.push_bind(limit);
        items_query.push(" OFFSET ");
        items_query.push_bind(offset);

        let items = items_query
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM products p");
        push_filters(&mut count_query, &query);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(ProductPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// Product with categories, attribute values, media and price history
    pub async fn find_one(&self, id: Uuid) -> Result<ProductDetail, ServiceError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;

        self.load_detail(product).await
    }

    /// Lookup by SKU, with the same related data as the id lookup
    pub async fn find_by_sku(&self, sku: &str) -> Result<ProductDetail, ServiceError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE sku = $1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;

        self.load_detail(product).await
    }

    async fn load_detail(&self, product: Product) -> Result<ProductDetail, ServiceError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.* FROM categories c
            INNER JOIN product_categories pc ON pc.category_id = c.id
            WHERE pc.product_id = $1
            ORDER BY c.path ASC
            "#,
        )
        .bind(product.id)
        .fetch_all(&self.pool)
        .await?;

        let attributes = sqlx::query_as::<_, ProductAttributeValue>(
            r#"
            SELECT pa.id, pa.attribute_id, a.code, a.name, a.attribute_type, a.unit, pa.value
            FROM product_attributes pa
            INNER JOIN attributes a ON a.id = pa.attribute_id
            WHERE pa.product_id = $1
            ORDER BY a.sort_order ASC
            "#,
        )
        .bind(product.id)
        .fetch_all(&self.pool)
        .await?;

        let media = sqlx::query_as::<_, Media>(
            "SELECT * FROM media WHERE product_id = $1 ORDER BY position ASC",
        )
        .bind(product.id)
        .fetch_all(&self.pool)
        .await?;

        let pricing = sqlx::query_as::<_, PriceRecord>(
            r#"
            SELECT * FROM price_records
            WHERE product_id = $1
            ORDER BY valid_from DESC NULLS LAST, created_at DESC
            "#,
        )
        .bind(product.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProductDetail {
            product,
            categories,
            attributes,
            media,
            pricing,
        })
    }

    /// Update a product
    pub async fn update(&self, id: Uuid, data: UpdateProduct) -> Result<Product, ServiceError> {
        info!("Updating product: {}", id);

        let mut tx = self.pool.begin().await?;

        let current =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product"))?;

        let sku = match data.sku {
            Some(sku) => {
                if sku.trim().is_empty() {
                    return Err(ServiceError::validation("SKU cannot be empty"));
                }
                sku.trim().to_string()
            }
            None => current.sku.clone(),
        };

        let title = match data.title {
            Some(title) => {
                if title.trim().is_empty() {
                    return Err(ServiceError::validation("title cannot be empty"));
                }
                title.trim().to_string()
            }
            None => current.title.clone(),
        };

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET sku = $1, title = $2, description = $3, brand = $4, manufacturer = $5,
                ean = $6, weight_kg = $7, dimensions_cm = $8, is_active = $9,
                seo_data = $10, tags = $11, updated_at = now()
            WHERE id = $12
            RETURNING *
            "#,
        )
        .bind(&sku)
        .bind(&title)
        .bind(data.description.or(current.description))
        .bind(data.brand.or(current.brand))
        .bind(data.manufacturer.or(current.manufacturer))
        .bind(data.ean.or(current.ean))
        .bind(data.weight_kg.or(current.weight_kg))
        .bind(data.dimensions_cm.map(Json).or(current.dimensions_cm))
        .bind(data.is_active.unwrap_or(current.is_active))
        .bind(data.seo_data.map(Json).or(current.seo_data))
        .bind(data.tags.unwrap_or(current.tags))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::conflict(format!("SKU '{}' is already in use", sku))
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(product)
    }

    /// Replace the category assignments of a product
    pub async fn assign_categories(
        &self,
        id: Uuid,
        category_ids: Vec<Uuid>,
    ) -> Result<Vec<Category>, ServiceError> {
        info!("Assigning {} categories to product {}", category_ids.len(), id);

        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(ServiceError::not_found("Product"));
        }

        sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for category_id in &category_ids {
            sqlx::query(
                "INSERT INTO product_categories (product_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(category_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    ServiceError::not_found("Category")
                } else {
                    e.into()
                }
            })?;
        }

        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT c.* FROM categories c
            INNER JOIN product_categories pc ON pc.category_id = c.id
            WHERE pc.product_id = $1
            ORDER BY c.path ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(categories)
    }

    /// Soft delete: the product stays in place with is_active = false
    pub async fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        info!("Removing product: {}", id);

        let affected =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if affected == 0 {
            return Err(ServiceError::not_found("Product"));
        }
        Ok(())
    }

    /// Hard delete: removes the row and, through cascades, its attribute
    /// values, media and price history
    pub async fn hard_remove(&self, id: Uuid) -> Result<(), ServiceError> {
        info!("Hard deleting product: {}", id);

        let affected = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(ServiceError::not_found("Product"));
        }
        Ok(())
    }
}

/// Append the JOIN/WHERE clauses shared by the listing and count queries.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    if let Some(category_id) = query.category_id {
        qb.push(" INNER JOIN product_categories pc ON pc.product_id = p.id AND pc.category_id = ");
        qb.push_bind(category_id);
    }

    qb.push(" WHERE 1 = 1");

    if let Some(search) = query.search.as_ref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        qb.push(" AND (p.title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.sku ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR p.brand ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    if let Some(is_active) = query.is_active {
        qb.push(" AND p.is_active = ");
        qb.push_bind(is_active);
    }
}
