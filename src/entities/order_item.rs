//! Order item entity - One line of an order, the source of truth for order totals.
//!
//! `unit_price`, `product_name`, and `product_sku` are point-in-time snapshots
//! of the product row taken when the order was placed; later product edits do
//! not rewrite history. `total_price = quantity * unit_price - discount_amount`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier for the order line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this line belongs to
    pub order_id: i64,
    /// Product being purchased
    pub product_id: i64,
    /// Units purchased, strictly positive
    pub quantity: i32,
    /// Per-unit price in cents, snapshot of the product price at order time
    pub unit_price: i64,
    /// Line-level discount in cents
    pub discount_amount: i64,
    /// Line total in cents: `quantity * unit_price - discount_amount`
    pub total_price: i64,
    /// Product name snapshot at order time
    pub product_name: String,
    /// Product SKU snapshot at order time
    pub product_sku: String,
}

/// Defines relationships between OrderItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    /// Each line references one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
