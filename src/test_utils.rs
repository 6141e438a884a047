//! Shared test utilities.
//!
//! This module provides common helper functions for setting up in-memory test
//! databases and creating test entities with sensible defaults.

use sea_orm::DatabaseConnection;

use crate::core::category;
use crate::core::order::{ItemDraft, OrderDraft, place_order};
use crate::core::product::{NewProduct, create_product};
use crate::core::review::{NewReview, create_review};
use crate::core::user::{NewUser, create_user};
use crate::entities;
use crate::entities::{order, review};
use crate::errors::Result;
use crate::schema::define_schema;

/// Creates an in-memory `SQLite` database with the full schema defined.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    define_schema(&db).await?;
    Ok(db)
}

/// Builds a [`NewUser`] keyed on a short handle.
///
/// The email is `<handle>@example.com`, so distinct handles stay unique.
pub fn test_new_user(handle: &str) -> NewUser {
    NewUser {
        username: handle.to_string(),
        email: format!("{handle}@example.com"),
        first_name: capitalize(handle),
        last_name: "Tester".to_string(),
        shipping_address: "1 Test Street, Springfield".to_string(),
        billing_address: "1 Test Street, Springfield".to_string(),
        registration_date: chrono::Utc::now(),
    }
}

/// Creates a test user with sensible defaults.
pub async fn create_test_user(
    db: &DatabaseConnection,
    handle: &str,
) -> Result<entities::user::Model> {
    create_user(db, test_new_user(handle)).await
}

/// Builds a [`NewProduct`] with a deterministic SKU derived from the name.
///
/// # Defaults
/// * `price`: 1999 cents
/// * `cost_price`: 999 cents
/// * `stock_quantity`: 50
/// * `min_stock_level`: 10
pub fn test_new_product(name: &str, category_id: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: None,
        category_id,
        sku: default_sku(name),
        price: 1_999,
        cost_price: 999,
        stock_quantity: 50,
        min_stock_level: 10,
    }
}

/// Creates a test product with sensible defaults.
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
    category_id: i64,
) -> Result<entities::product::Model> {
    create_product(db, test_new_product(name, category_id)).await
}

/// Builds an [`OrderDraft`] with pending status and card payment.
pub fn test_order_draft(
    user_id: i64,
    order_number: &str,
    shipping_cost: i64,
    items: Vec<ItemDraft>,
) -> OrderDraft {
    OrderDraft {
        user_id,
        order_number: order_number.to_string(),
        status: order::OrderStatus::Pending,
        order_date: chrono::Utc::now(),
        shipping_cost,
        discount_amount: 0,
        payment_method: order::PaymentMethod::CreditCard,
        payment_status: order::PaymentStatus::Pending,
        items,
    }
}

/// Places a one-line order (quantity 1, shipping 5.99) for common scenarios.
pub async fn create_test_order(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    order_number: &str,
) -> Result<(entities::order::Model, Vec<entities::order_item::Model>)> {
    place_order(
        db,
        test_order_draft(
            user_id,
            order_number,
            599,
            vec![ItemDraft {
                product_id,
                quantity: 1,
                discount_amount: 0,
            }],
        ),
    )
    .await
}

/// Builds a [`NewReview`] outside any order, pending moderation.
pub fn test_new_review(user_id: i64, product_id: i64, rating: i32) -> NewReview {
    NewReview {
        product_id,
        user_id,
        order_id: None,
        rating,
        title: Some("Test review".to_string()),
        body: None,
        verified_purchase: false,
        status: review::ReviewStatus::Pending,
        review_date: chrono::Utc::now(),
    }
}

/// Creates a test review with sensible defaults.
pub async fn create_test_review(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    rating: i32,
) -> Result<entities::review::Model> {
    create_review(db, test_new_review(user_id, product_id, rating)).await
}

/// Sets up a database with one category ("Gadgets").
/// Returns (db, category) for catalog tests.
pub async fn setup_with_category() -> Result<(DatabaseConnection, entities::category::Model)> {
    let db = setup_test_db().await?;
    let gadgets = category::create_category(&db, "Gadgets", None, None, 0).await?;
    Ok((db, gadgets))
}

/// Sets up a database with one user ("ada") and one category ("Gadgets").
/// Returns (db, user, category) for order and review tests.
pub async fn setup_with_user_and_category() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::category::Model,
)> {
    let db = setup_test_db().await?;
    let ada = create_test_user(&db, "ada").await?;
    let gadgets = category::create_category(&db, "Gadgets", None, None, 0).await?;
    Ok((db, ada, gadgets))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

fn default_sku(name: &str) -> String {
    let parts: Vec<String> = name
        .split_whitespace()
        .take(2)
        .map(|word| word.chars().take(3).collect::<String>().to_uppercase())
        .collect();
    format!("{}-0001", parts.join("-"))
}
