//! Order entity - One customer purchase, settled together with its order items.
//!
//! `subtotal`, `tax_amount`, and `total_amount` are derived from the order's
//! item rows: `subtotal` is the sum of item totals, tax is a fixed percentage
//! of the subtotal, and `total_amount = subtotal + tax + shipping - discount`.
//! All monetary fields are integer cents.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfillment state of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Processing")]
    Processing,
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    #[sea_orm(string_value = "Refunded")]
    Refunded,
}

/// How the customer chose to pay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "Credit Card")]
    CreditCard,
    #[sea_orm(string_value = "Debit Card")]
    DebitCard,
    #[sea_orm(string_value = "PayPal")]
    PayPal,
    #[sea_orm(string_value = "Bank Transfer")]
    BankTransfer,
    #[sea_orm(string_value = "Cash on Delivery")]
    CashOnDelivery,
}

/// Settlement state of the payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Paid")]
    Paid,
    #[sea_orm(string_value = "Failed")]
    Failed,
    #[sea_orm(string_value = "Refunded")]
    Refunded,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who placed the order
    pub user_id: i64,
    /// Human-facing order reference, unique across the store
    #[sea_orm(unique)]
    pub order_number: String,
    /// Fulfillment state
    pub status: OrderStatus,
    /// When the order was placed
    pub order_date: DateTimeUtc,
    /// Sum of item totals in cents, derived from order items
    pub subtotal: i64,
    /// Tax in cents, derived from the subtotal
    pub tax_amount: i64,
    /// Shipping charge in cents
    pub shipping_cost: i64,
    /// Order-level discount in cents
    pub discount_amount: i64,
    /// Grand total in cents, derived per the order arithmetic
    pub total_amount: i64,
    /// How the customer chose to pay
    pub payment_method: PaymentMethod,
    /// Settlement state of the payment
    pub payment_status: PaymentStatus,
    /// Shipping address snapshot taken at order time
    pub shipping_address: String,
    /// Billing address snapshot taken at order time
    pub billing_address: String,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One order holds many order items
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
    /// One order may be referenced by many reviews
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
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
