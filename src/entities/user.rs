//! User entity - The identity anchor for orders and reviews.
//!
//! Each user has unique `username` and `email` values, an account status, and the
//! loyalty/spending counters that accrue as orders settle. Monetary amounts are
//! stored in integer cents.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account lifecycle state for a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AccountStatus {
    #[sea_orm(string_value = "Active")]
    Active,
    #[sea_orm(string_value = "Inactive")]
    Inactive,
    #[sea_orm(string_value = "Suspended")]
    Suspended,
}

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login handle, unique across the store
    #[sea_orm(unique)]
    pub username: String,
    /// Contact address, unique across the store
    #[sea_orm(unique)]
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account lifecycle state
    pub status: AccountStatus,
    /// Accrued loyalty points, never negative
    pub loyalty_points: i32,
    /// Lifetime spending in cents, never negative
    pub total_spent: i64,
    /// Default shipping address
    pub shipping_address: String,
    /// Default billing address
    pub billing_address: String,
    /// When the account was registered
    pub registration_date: DateTimeUtc,
    /// Row creation timestamp
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user places many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One user writes many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
