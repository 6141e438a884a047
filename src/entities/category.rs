//! Category entity - A self-referential forest of product categories.
//!
//! `parent_id` points at another category row or is `None` for a root. Parent
//! links must stay acyclic; the hierarchy logic in [`crate::core::category`]
//! enforces that on every (re)parent operation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Parent category, `None` for roots
    pub parent_id: Option<i64>,
    /// Optional free-form description
    pub description: Option<String>,
    /// Whether the category is shown to shoppers
    pub is_active: bool,
    /// Manual ordering hint within a parent
    pub sort_order: i32,
    /// Row creation timestamp
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each non-root category belongs to one parent category
    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,
    /// One category groups many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
