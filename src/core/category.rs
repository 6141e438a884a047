//! Category hierarchy business logic.
//!
//! Categories form a forest: a flat table where each row carries an optional
//! `parent_id`. This module owns the two operations that can change the shape
//! of that forest (create, reparent) and the traversal over it. Traversal is an
//! explicit worklist walk over rows already in memory - no recursive SQL - and
//! every parent-link mutation re-runs the cycle guard before committing.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder, Set,
};

use crate::entities::{Category, category};
use crate::errors::{Error, Result};

/// Creates a new category under the given parent (or as a root).
///
/// The parent chain is checked on every insert: the parent must exist, and
/// walking its ancestors must terminate at a root without revisiting a node.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] for an empty name or missing parent,
/// [`Error::Cycle`] if the parent chain does not terminate.
pub async fn create_category(
    db: &DatabaseConnection,
    name: &str,
    parent_id: Option<i64>,
    description: Option<String>,
    sort_order: i32,
) -> Result<category::Model> {
    if name.trim().is_empty() {
        return Err(Error::check_range("categories.name must be non-empty"));
    }
    if let Some(parent) = parent_id {
        ensure_chain_terminates(db, parent, None).await?;
    }

    let row = category::ActiveModel {
        name: Set(name.trim().to_string()),
        parent_id: Set(parent_id),
        description: Set(description),
        is_active: Set(true),
        sort_order: Set(sort_order),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Moves a category under a new parent (or to the root level).
///
/// Rejected when the new parent is the category itself or one of its
/// descendants, which is exactly when walking parent links from the new parent
/// would reach the category being moved.
///
/// # Errors
/// Returns [`Error::NotFound`] for a missing category,
/// [`Error::ConstraintViolation`] for a missing parent, and [`Error::Cycle`]
/// when the move would close a loop. The tree is left unchanged on error.
pub async fn reparent_category(
    db: &DatabaseConnection,
    category_id: i64,
    new_parent_id: Option<i64>,
) -> Result<category::Model> {
    let row = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "category",
            id: category_id,
        })?;

    if let Some(parent) = new_parent_id {
        ensure_chain_terminates(db, parent, Some(category_id)).await?;
    }

    let mut row: category::ActiveModel = row.into();
    row.parent_id = Set(new_parent_id);
    row.update(db).await.map_err(Into::into)
}

/// Loads every category row, the input to [`walk_forest`].
pub async fn load_forest(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Walks the forest lazily, yielding `(category, depth)` pairs ordered by
/// `(depth, name)`: all roots sorted by name, then all their children sorted
/// by name, and so on. Each node is visited exactly once; a node whose parent
/// chain never reaches a root is never yielded. The walk is a pure function of
/// its input and can be restarted by calling it again.
pub fn walk_forest(categories: &[category::Model]) -> ForestWalk<'_> {
    let mut children_of: HashMap<i64, Vec<&category::Model>> = HashMap::new();
    let mut roots: Vec<&category::Model> = Vec::new();
    for row in categories {
        match row.parent_id {
            None => roots.push(row),
            Some(parent) => children_of.entry(parent).or_default().push(row),
        }
    }
    sort_layer(&mut roots);

    ForestWalk {
        children_of,
        visited: HashSet::new(),
        current: roots.into_iter(),
        next_layer: Vec::new(),
        depth: 0,
    }
}

/// Lazy `(category, depth)` iterator produced by [`walk_forest`].
pub struct ForestWalk<'a> {
    children_of: HashMap<i64, Vec<&'a category::Model>>,
    visited: HashSet<i64>,
    current: std::vec::IntoIter<&'a category::Model>,
    next_layer: Vec<&'a category::Model>,
    depth: u32,
}

impl<'a> Iterator for ForestWalk<'a> {
    type Item = (&'a category::Model, u32);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(node) = self.current.next() {
                if !self.visited.insert(node.id) {
                    continue;
                }
                if let Some(children) = self.children_of.get(&node.id) {
                    self.next_layer.extend(children.iter().copied());
                }
                return Some((node, self.depth));
            }
            if self.next_layer.is_empty() {
                return None;
            }
            let mut layer = std::mem::take(&mut self.next_layer);
            sort_layer(&mut layer);
            self.current = layer.into_iter();
            self.depth += 1;
        }
    }
}

fn sort_layer(layer: &mut [&category::Model]) {
    layer.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

/// Walks parent links from `start` until a root is reached.
///
/// `moving` names a category about to be re-parented; encountering it on the
/// chain means the move would close a loop. Revisiting any node means the
/// stored chain is already corrupt.
async fn ensure_chain_terminates<C: ConnectionTrait>(
    db: &C,
    start: i64,
    moving: Option<i64>,
) -> Result<()> {
    let mut seen: HashSet<i64> = HashSet::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if moving == Some(id) {
            return Err(Error::Cycle { category_id: id });
        }
        if !seen.insert(id) {
            return Err(Error::Cycle { category_id: id });
        }
        let row = Category::find_by_id(id).one(db).await?.ok_or_else(|| {
            Error::foreign_key(format!(
                "categories.parent_id references missing category {id}"
            ))
        })?;
        current = row.parent_id;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ConstraintKind;
    use crate::test_utils::*;

    /// Seeds the reference catalog: two roots with two and two children.
    async fn seed_catalog(db: &DatabaseConnection) -> Result<()> {
        let electronics = create_category(db, "Electronics", None, None, 0).await?;
        create_category(db, "Smartphones", Some(electronics.id), None, 0).await?;
        create_category(db, "Laptops", Some(electronics.id), None, 1).await?;
        let clothing = create_category(db, "Clothing", None, None, 1).await?;
        create_category(db, "Men's Clothing", Some(clothing.id), None, 0).await?;
        create_category(db, "Women's Clothing", Some(clothing.id), None, 1).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_walk_orders_by_depth_then_name() -> Result<()> {
        let db = setup_test_db().await?;
        seed_catalog(&db).await?;

        let rows = load_forest(&db).await?;
        let walked: Vec<(String, u32)> = walk_forest(&rows)
            .map(|(node, depth)| (node.name.clone(), depth))
            .collect();

        assert_eq!(
            walked,
            vec![
                ("Clothing".to_string(), 0),
                ("Electronics".to_string(), 0),
                ("Laptops".to_string(), 1),
                ("Men's Clothing".to_string(), 1),
                ("Smartphones".to_string(), 1),
                ("Women's Clothing".to_string(), 1),
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_walk_visits_each_node_once_and_restarts() -> Result<()> {
        let db = setup_test_db().await?;
        seed_catalog(&db).await?;

        let rows = load_forest(&db).await?;
        let first: Vec<i64> = walk_forest(&rows).map(|(node, _)| node.id).collect();
        let second: Vec<i64> = walk_forest(&rows).map(|(node, _)| node.id).collect();

        assert_eq!(first.len(), 6);
        let distinct: HashSet<i64> = first.iter().copied().collect();
        assert_eq!(distinct.len(), 6);
        assert_eq!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_rejects_missing_parent() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_category(&db, "Orphans", Some(999), None, 0).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ConstraintViolation {
                kind: ConstraintKind::ForeignKey,
                rule: _
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_reparent_to_self_is_a_cycle() -> Result<()> {
        let db = setup_test_db().await?;
        let electronics = create_category(&db, "Electronics", None, None, 0).await?;
        let laptops = create_category(&db, "Laptops", Some(electronics.id), None, 0).await?;

        let result = reparent_category(&db, laptops.id, Some(laptops.id)).await;
        assert!(matches!(result.unwrap_err(), Error::Cycle { category_id } if category_id == laptops.id));

        // The tree is unchanged.
        let row = Category::find_by_id(laptops.id).one(&db).await?.unwrap();
        assert_eq!(row.parent_id, Some(electronics.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_reparent_under_descendant_is_a_cycle() -> Result<()> {
        let db = setup_test_db().await?;
        let electronics = create_category(&db, "Electronics", None, None, 0).await?;
        let laptops = create_category(&db, "Laptops", Some(electronics.id), None, 0).await?;
        let gaming = create_category(&db, "Gaming Laptops", Some(laptops.id), None, 0).await?;

        let result = reparent_category(&db, electronics.id, Some(gaming.id)).await;
        assert!(matches!(result.unwrap_err(), Error::Cycle { category_id: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_reparent_between_roots() -> Result<()> {
        let db = setup_test_db().await?;
        let electronics = create_category(&db, "Electronics", None, None, 0).await?;
        let accessories = create_category(&db, "Accessories", None, None, 1).await?;

        let moved = reparent_category(&db, accessories.id, Some(electronics.id)).await?;
        assert_eq!(moved.parent_id, Some(electronics.id));

        let promoted = reparent_category(&db, accessories.id, None).await?;
        assert_eq!(promoted.parent_id, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_reparent_missing_category() -> Result<()> {
        let db = setup_test_db().await?;

        let result = reparent_category(&db, 42, None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "category",
                id: 42
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_walk_round_trip_rebuilds_isomorphic_forest() -> Result<()> {
        let db = setup_test_db().await?;
        seed_catalog(&db).await?;
        let rows = load_forest(&db).await?;

        // Rebuild into a fresh store from the walk sequence. Parents always
        // precede children in (depth, name) order, so a single pass suffices.
        let rebuilt_db = setup_test_db().await?;
        let mut id_map: HashMap<i64, i64> = HashMap::new();
        for (node, _) in walk_forest(&rows) {
            let parent = node.parent_id.map(|old| id_map[&old]);
            let created = create_category(
                &rebuilt_db,
                &node.name,
                parent,
                node.description.clone(),
                node.sort_order,
            )
            .await?;
            id_map.insert(node.id, created.id);
        }

        // Isomorphic: same (name, parent name) pairs on both sides.
        let edge_set = |rows: &[category::Model]| -> HashSet<(String, Option<String>)> {
            let names: HashMap<i64, String> =
                rows.iter().map(|row| (row.id, row.name.clone())).collect();
            rows.iter()
                .map(|row| {
                    (
                        row.name.clone(),
                        row.parent_id.map(|parent| names[&parent].clone()),
                    )
                })
                .collect()
        };

        let rebuilt_rows = load_forest(&rebuilt_db).await?;
        assert_eq!(edge_set(&rows), edge_set(&rebuilt_rows));

        Ok(())
    }
}
