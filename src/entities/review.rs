//! Review entity - Customer feedback on a product, optionally tied to an order.
//!
//! At most one review may exist per `(user_id, product_id, order_id)` triple;
//! a missing `order_id` is treated as a value of its own, so a user can review
//! a product once outside any order and once per order they bought it in.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation state of a review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReviewStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

/// Review database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    /// Unique identifier for the review
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product being reviewed
    pub product_id: i64,
    /// User who wrote the review
    pub user_id: i64,
    /// Order the purchase was made in, if any
    pub order_id: Option<i64>,
    /// Star rating in [1, 5]
    pub rating: i32,
    /// Optional headline
    pub title: Option<String>,
    /// Optional body text
    pub body: Option<String>,
    /// Whether the review is tied to a completed purchase
    pub verified_purchase: bool,
    /// Moderation state
    pub status: ReviewStatus,
    /// When the review was submitted
    pub review_date: DateTimeUtc,
}

/// Defines relationships between Review and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each review targets one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each review is written by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// A review may reference the order it verifies
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
