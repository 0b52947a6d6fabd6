use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// SEO metadata stored as jsonb on categories and products.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

/// Hierarchical category with a materialized path.
///
/// `path` is always the parent's path plus this node's slug (`/electronics/phones`)
/// and `level` is always `parent.level + 1`, with roots at `/slug` and level 0.
/// Both are recomputed whenever the parent or the slug changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub path: String,
    pub level: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub seo_data: Option<Json<SeoData>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category with its nested children, as served by the tree endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// Compute the materialized path and level for a node under `parent`.
pub fn compute_path(parent: Option<&Category>, slug: &str) -> (String, i32) {
    match parent {
        Some(parent) => (format!("{}/{}", parent.path, slug), parent.level + 1),
        None => (format!("/{}", slug), 0),
    }
}

/// URL-safe slug: lowercase ascii letters, digits and single hyphens,
/// starting and ending alphanumeric.
pub fn is_valid_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Assemble a forest out of the active categories.
///
/// `rows` must already be filtered to active nodes and sorted by the desired
/// sibling order; the row order is preserved for both roots and children.
/// A node whose parent is not in `rows` (inactive or missing) is unreachable
/// and dropped. Each node is attached at most once, so the assembly
/// terminates even if the stored parent links were ever corrupted into a
/// cycle.
pub fn build_forest(rows: Vec<Category>) -> Vec<CategoryNode> {
    let mut children_of: HashMap<Uuid, Vec<Category>> = HashMap::new();
    let mut roots: Vec<Category> = Vec::new();

    for row in rows {
        match row.parent_id {
            Some(parent_id) => children_of.entry(parent_id).or_default().push(row),
            None => roots.push(row),
        }
    }

    fn attach(category: Category, children_of: &mut HashMap<Uuid, Vec<Category>>) -> CategoryNode {
        let children = children_of
            .remove(&category.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| attach(child, children_of))
            .collect();
        CategoryNode { category, children }
    }

    roots
        .into_iter()
        .map(|root| attach(root, &mut children_of))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: Uuid, parent: Option<&Category>, slug: &str, sort_order: i32) -> Category {
        let (path, level) = compute_path(parent, slug);
        Category {
            id,
            name: slug.to_string(),
            slug: slug.to_string(),
            description: None,
            parent_id: parent.map(|p| p.id),
            path,
            level,
            sort_order,
            is_active: true,
            seo_data: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn root_path_is_slash_slug_at_level_zero() {
        let (path, level) = compute_path(None, "electronics");
        assert_eq!(path, "/electronics");
        assert_eq!(level, 0);
    }

    #[test]
    fn child_path_extends_parent_path() {
        let electronics = category(Uuid::new_v4(), None, "electronics", 0);
        let (path, level) = compute_path(Some(&electronics), "phones");
        assert_eq!(path, "/electronics/phones");
        assert_eq!(level, 1);

        let phones = category(Uuid::new_v4(), Some(&electronics), "phones", 0);
        let (path, level) = compute_path(Some(&phones), "smartphones");
        assert_eq!(path, "/electronics/phones/smartphones");
        assert_eq!(level, 2);
    }

    #[test]
    fn validates_slugs() {
        assert!(is_valid_slug("electronics"));
        assert!(is_valid_slug("mobile-phones"));
        assert!(is_valid_slug("4k-tvs"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Electronics"));
        assert!(!is_valid_slug("mobile phones"));
        assert!(!is_valid_slug("-phones"));
        assert!(!is_valid_slug("phones-"));
        assert!(!is_valid_slug("mobile--phones"));
        assert!(!is_valid_slug("caf\u{e9}"));
    }

    #[test]
    fn builds_forest_with_nested_children_in_row_order() {
        let electronics = category(Uuid::new_v4(), None, "electronics", 0);
        let books = category(Uuid::new_v4(), None, "books", 1);
        let phones = category(Uuid::new_v4(), Some(&electronics), "phones", 0);
        let laptops = category(Uuid::new_v4(), Some(&electronics), "laptops", 1);
        let smartphones = category(Uuid::new_v4(), Some(&phones), "smartphones", 0);

        let forest = build_forest(vec![
            electronics.clone(),
            books.clone(),
            phones.clone(),
            laptops.clone(),
            smartphones.clone(),
        ]);

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].category.slug, "electronics");
        assert_eq!(forest[1].category.slug, "books");

        let children: Vec<&str> = forest[0]
            .children
            .iter()
            .map(|c| c.category.slug.as_str())
            .collect();
        assert_eq!(children, vec!["phones", "laptops"]);
        assert_eq!(forest[0].children[0].children[0].category.slug, "smartphones");
        assert!(forest[1].children.is_empty());
    }

    #[test]
    fn drops_nodes_under_missing_parents() {
        let electronics = category(Uuid::new_v4(), None, "electronics", 0);
        // Parent was deactivated and therefore is not part of the row set
        let mut orphan = category(Uuid::new_v4(), None, "phones", 0);
        orphan.parent_id = Some(Uuid::new_v4());

        let forest = build_forest(vec![electronics, orphan]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].category.slug, "electronics");
    }

    #[test]
    fn forest_assembly_terminates_on_corrupt_parent_links() {
        // Two nodes pointing at each other: neither is a root, both dropped.
        let a_id = Uuid::new_v4();
        let b_id = Uuid::new_v4();
        let root = category(Uuid::new_v4(), None, "root", 0);
        let mut a = category(a_id, None, "a", 0);
        let mut b = category(b_id, None, "b", 1);
        a.parent_id = Some(b_id);
        b.parent_id = Some(a_id);

        let forest = build_forest(vec![root, a, b]);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].category.slug, "root");
    }

    #[test]
    fn no_node_is_reachable_from_itself() {
        let electronics = category(Uuid::new_v4(), None, "electronics", 0);
        let phones = category(Uuid::new_v4(), Some(&electronics), "phones", 0);
        let forest = build_forest(vec![electronics, phones]);

        fn walk(node: &CategoryNode, seen: &mut Vec<Uuid>) {
            assert!(!seen.contains(&node.category.id));
            seen.push(node.category.id);
            for child in &node.children {
                walk(child, seen);
            }
        }

        let mut seen = Vec::new();
        for root in &forest {
            walk(root, &mut seen);
        }
        assert_eq!(seen.len(), 2);
    }
}
