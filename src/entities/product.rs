//! Product entity - Catalog items available for ordering and review.
//!
//! `rating_average` and `rating_count` are derived fields: review rows are the
//! source of truth and [`crate::core::reconcile`] regenerates both. Prices are
//! integer cents.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog lifecycle state for a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ProductStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Discontinued")]
    Discontinued,
}

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional marketing copy
    pub description: Option<String>,
    /// Category this product is filed under
    pub category_id: i64,
    /// Stock-keeping unit, unique across the catalog
    #[sea_orm(unique)]
    pub sku: String,
    /// Sale price in cents, strictly positive
    pub price: i64,
    /// Acquisition cost in cents, never negative
    pub cost_price: i64,
    /// Units on hand, never negative
    pub stock_quantity: i32,
    /// Reorder threshold used by the low-stock report
    pub min_stock_level: i32,
    /// Catalog lifecycle state
    pub status: ProductStatus,
    /// Mean review rating in [0, 5], derived from review rows
    pub rating_average: f64,
    /// Number of reviews, derived from review rows
    pub rating_count: i32,
    /// Row creation timestamp
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// One product appears on many order lines
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    /// One product accrues many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
