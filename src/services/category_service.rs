use serde::Deserialize;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::models::category::{build_forest, compute_path, is_valid_slug};
use crate::database::models::{Category, CategoryNode, SeoData};
use crate::database::DatabaseManager;
use crate::services::error::{is_unique_violation, ServiceError};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub seo_data: Option<SeoData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    /// `parent_id: null` reparents to the root level; omitting the field
    /// leaves the parent untouched.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub seo_data: Option<SeoData>,
}

fn default_true() -> bool {
    true
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Maintains the materialized-path category hierarchy.
///
/// Every compound read-then-write (resolve parent, compute path, persist)
/// runs in a single transaction with the parent row locked, so a concurrent
/// rename or move cannot leave a child with a stale path.
pub struct CategoryService {
    pool: PgPool,
}

impl CategoryService {
    pub async fn new() -> Result<Self, ServiceError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    /// Flat list of active categories, ordered by path
    pub async fn find_all(&self) -> Result<Vec<Category>, ServiceError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE is_active = TRUE ORDER BY path ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Fetch one category by id, active or not
    pub async fn find_one(&self, id: Uuid) -> Result<Category, ServiceError> {
        sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category"))
    }

    /// Nested tree of active categories, siblings ordered by sort_order.
    /// With `roots_only` the forest stops at the top level.
    ///
    /// Children of inactive categories are unreachable and therefore absent
    /// from the result even though they stay active themselves.
    pub async fn tree(&self, roots_only: bool) -> Result<Vec<CategoryNode>, ServiceError> {
        let sql = if roots_only {
            "SELECT * FROM categories WHERE is_active = TRUE AND parent_id IS NULL \
             ORDER BY sort_order ASC, name ASC"
        } else {
            "SELECT * FROM categories WHERE is_active = TRUE ORDER BY sort_order ASC, name ASC"
        };
        let rows = sqlx::query_as::<_, Category>(sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(build_forest(rows))
    }

    /// Create a category with a computed path and level
    pub async fn create(&self, data: CreateCategory) -> Result<Category, ServiceError> {
        info!("Creating category: {}", data.name);

        if data.name.trim().is_empty() {
            return Err(ServiceError::validation("name cannot be empty"));
        }
        if !is_valid_slug(&data.slug) {
            return Err(ServiceError::validation(format!(
                "slug '{}' is not URL-safe (lowercase letters, digits and hyphens)",
                data.slug
            )));
        }

        let mut tx = self.pool.begin().await?;

        let taken = sqlx::query_scalar::<_, i32>("SELECT 1 FROM categories WHERE slug = $1")
            .bind(&data.slug)
            .fetch_optional(&mut *tx)
            .await?;
        if taken.is_some() {
            return Err(ServiceError::conflict(format!(
                "slug '{}' is already in use",
                data.slug
            )));
        }

        // Lock the parent so its path/level cannot shift under us
        let parent = match data.parent_id {
            Some(parent_id) => Some(self.lock_active_parent(&mut tx, parent_id).await?),
            None => None,
        };

        let (path, level) = compute_path(parent.as_ref(), &data.slug);

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories
                (name, slug, description, parent_id, path, level, sort_order, is_active, seo_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.slug)
        .bind(&data.description)
        .bind(data.parent_id)
        .bind(&path)
        .bind(level)
        .bind(data.sort_order)
        .bind(data.is_active)
        .bind(data.seo_data.map(Json))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::conflict(format!("slug '{}' is already in use", data.slug))
            } else {
                e.into()
            }
        })?;

        tx.commit().await?;
        Ok(category)
    }

    /// Update a category; recomputes path/level when the parent or slug
    /// changes and cascades the rewrite to the whole subtree.
    pub async fn update(&self, id: Uuid, data: UpdateCategory) -> Result<Category, ServiceError> {
        info!("Updating category: {}", id);

        let mut tx = self.pool.begin().await?;

        let current =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ServiceError::not_found("Category"))?;

        let name = match data.name {
            Some(name) => {
                if name.trim().is_empty() {
                    return Err(ServiceError::validation("name cannot be empty"));
                }
                name.trim().to_string()
            }
            None => current.name.clone(),
        };

        let slug = match data.slug {
            Some(slug) => {
                if !is_valid_slug(&slug) {
                    return Err(ServiceError::validation(format!(
                        "slug '{}' is not URL-safe (lowercase letters, digits and hyphens)",
                        slug
                    )));
                }
                slug
            }
            None => current.slug.clone(),
        };

        if slug != current.slug {
            let taken =
                sqlx::query_scalar::<_, i32>("SELECT 1 FROM categories WHERE slug = $1 AND id <> $2")
                    .bind(&slug)
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            if taken.is_some() {
                return Err(ServiceError::conflict(format!(
                    "slug '{}' is already in use",
                    slug
                )));
            }
        }

        let parent_id = match data.parent_id {
            Some(new_parent) => new_parent,
            None => current.parent_id,
        };

        // Recompute path/level whenever the parent or the slug changed
        let (path, level) = if parent_id != current.parent_id || slug != current.slug {
            let parent = match parent_id {
                Some(pid) => {
                    if pid == id {
                        return Err(ServiceError::validation(
                            "category cannot be its own parent",
                        ));
                    }
                    self.ensure_not_descendant(&mut tx, id, pid).await?;
                    Some(self.lock_active_parent(&mut tx, pid).await?)
                }
                None => None,
            };
            compute_path(parent.as_ref(), &slug)
        } else {
            (current.path.clone(), current.level)
        };

        // Keep every descendant's path/level consistent with the new prefix.
        // Slugs are restricted to [a-z0-9-], so the path is LIKE-safe.
        if path != current.path {
            sqlx::query(
                r#"
                UPDATE categories
                SET path = $1 || substr(path, char_length($2) + 1),
                    level = level + $3,
                    updated_at = now()
                WHERE path LIKE $2 || '/%'
                "#,
            )
            .bind(&path)
            .bind(&current.path)
            .bind(level - current.level)
            .execute(&mut *tx)
            .await?;
        }

        let seo_data = match data.seo_data {
            Some(seo) => Some(Json(seo)),
            None => current.seo_data,
        };

        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $1, slug = $2, description = $3, parent_id = $4, path = $5,
                level = $6, sort_order = $7, is_active = $8, seo_data = $9,
                updated_at = now()
            WHERE id = $10
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(data.description.or(current.description))
        .bind(parent_id)
        .bind(&path)
        .bind(level)
        .bind(data.sort_order.unwrap_or(current.sort_order))
        .bind(data.is_active.unwrap_or(current.is_active))
        .bind(seo_data)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(category)
    }

    /// Deactivate a category. The row stays addressable by id and children
    /// keep their own is_active flag: deactivation does NOT cascade, it only
    /// makes the subtree unreachable through the tree endpoint.
    pub async fn soft_delete(&self, id: Uuid) -> Result<(), ServiceError> {
        info!("Removing category: {}", id);

        let affected = sqlx::query(
            "UPDATE categories SET is_active = FALSE, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(ServiceError::not_found("Category"));
        }
        Ok(())
    }

    async fn lock_active_parent(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: Uuid,
    ) -> Result<Category, ServiceError> {
        sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE id = $1 AND is_active = TRUE FOR UPDATE",
        )
        .bind(parent_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Parent category"))
    }

    /// Reject a reparent that would make `id` an ancestor of itself: walk up
    /// from the proposed parent and fail if the walk passes through `id`.
    async fn ensure_not_descendant(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: Uuid,
        proposed_parent: Uuid,
    ) -> Result<(), ServiceError> {
        let mut cursor = Some(proposed_parent);
        while let Some(ancestor) = cursor {
            if ancestor == id {
                return Err(ServiceError::validation(
                    "move would create a cycle in the category tree",
                ));
            }
            cursor =
                sqlx::query_scalar::<_, Option<Uuid>>("SELECT parent_id FROM categories WHERE id = $1")
                    .bind(ancestor)
                    .fetch_optional(&mut **tx)
                    .await?
                    .flatten();
        }
        Ok(())
    }
}
