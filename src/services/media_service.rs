use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::models::media::MediaMetadata;
use crate::database::models::{Media, MediaType};
use crate::database::DatabaseManager;
use crate::services::error::{is_foreign_key_violation, ServiceError};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMedia {
    pub product_id: Uuid,
    /// Raw type string; parsed against the closed MediaType set.
    pub media_type: String,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub metadata: Option<MediaMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMedia {
    pub url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub alt_text: Option<String>,
    pub title: Option<String>,
    pub position: Option<i32>,
    pub metadata: Option<MediaMetadata>,
}

/// Media assets per product. URLs point into external storage; the bytes
/// never pass through this service.
pub struct MediaService {
    pool: PgPool,
}

impl MediaService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    /// Gallery for a product, ordered by position
    pub async fn find_by_product(&self, product_id: Uuid) -> Result<Vec<Media>, ServiceError> {
        let media = sqlx::query_as::<_, Media>(
            "SELECT * FROM media WHERE product_id = $1 ORDER BY position ASC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(media)
    }

    pub async fn create(&self, data: CreateMedia) -> Result<Media, ServiceError> {
        info!("Creating media for product: {}", data.product_id);

        let media_type = data
            .media_type
            .parse::<MediaType>()
            .map_err(|e| ServiceError::validation(e.to_string()))?;

        if data.url.trim().is_empty() {
            return Err(ServiceError::validation("url cannot be empty"));
        }

        let media = sqlx::query_as::<_, Media>(
            r#"
            INSERT INTO media
                (product_id, media_type, url, thumbnail_url, alt_text, title,
                 position, is_primary, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.product_id)
        .bind(media_type)
        .bind(data.url.trim())
        .bind(&data.thumbnail_url)
        .bind(&data.alt_text)
        .bind(&data.title)
        .bind(data.position)
        .bind(data.is_primary)
        .bind(data.metadata.map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ServiceError::not_found("Product")
            } else {
                e.into()
            }
        })?;

        Ok(media)
    }

    pub async fn update(&self, id: Uuid, data: UpdateMedia) -> Result<Media, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Media>("SELECT * FROM media WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("Media"))?;

        let url = match data.url {
            Some(url) => {
                if url.trim().is_empty() {
                    return Err(ServiceError::validation("url cannot be empty"));
                }
                url.trim().to_string()
            }
            None => current.url.clone(),
        };

        let media = sqlx::query_as::<_, Media>(
            r#"
            UPDATE media
            SET url = $1, thumbnail_url = $2, alt_text = $3, title = $4,
                position = $5, metadata = $6, updated_at = now()
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(&url)
        .bind(data.thumbnail_url.or(current.thumbnail_url))
        .bind(data.alt_text.or(current.alt_text))
        .bind(data.title.or(current.title))
        .bind(data.position.unwrap_or(current.position))
        .bind(data.metadata.map(Json).or(current.metadata))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(media)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), ServiceError> {
        let affected = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(ServiceError::not_found("Media"));
        }
        Ok(())
    }

    /// Make one asset the product's primary image. Clearing the previous
    /// primary and setting the new one happen in one transaction, so the
    /// product never ends up with two primaries.
    pub async fn set_primary(&self, id: Uuid) -> Result<Media, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let media = sqlx::query_as::<_, Media>("SELECT * FROM media WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("Media"))?;

        sqlx::query(
            "UPDATE media SET is_primary = FALSE, updated_at = now() WHERE product_id = $1 AND is_primary = TRUE",
        )
        .bind(media.product_id)
        .execute(&mut *tx)
        .await?;

        let media = sqlx::query_as::<_, Media>(
            "UPDATE media SET is_primary = TRUE, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(media)
    }
}
