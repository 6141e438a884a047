//! Product business logic - Handles all catalog operations.
//!
//! Provides functions for creating products and for the two fields that
//! legitimately move after creation: the sale price and the stock level. The
//! derived rating fields are owned by [`crate::core::reconcile`] and are never
//! touched here.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::{Category, Product, product};
use crate::errors::{Error, Result};

/// Field values for a new catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub sku: String,
    /// Sale price in cents, strictly positive
    pub price: i64,
    /// Acquisition cost in cents, never negative
    pub cost_price: i64,
    pub stock_quantity: i32,
    pub min_stock_level: i32,
}

/// Creates a new product, validating ranges, SKU uniqueness, and the category
/// reference before the row is written. Rating fields start at zero.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] naming the violated rule.
pub async fn create_product(db: &DatabaseConnection, new: NewProduct) -> Result<product::Model> {
    if new.name.trim().is_empty() {
        return Err(Error::check_range("products.name must be non-empty"));
    }
    if new.sku.trim().is_empty() {
        return Err(Error::check_range("products.sku must be non-empty"));
    }
    if new.price <= 0 {
        return Err(Error::check_range(format!(
            "products.price {} cents must be positive",
            new.price
        )));
    }
    if new.cost_price < 0 {
        return Err(Error::check_range(format!(
            "products.cost_price {} cents must be non-negative",
            new.cost_price
        )));
    }
    if new.stock_quantity < 0 {
        return Err(Error::check_range(format!(
            "products.stock_quantity {} must be non-negative",
            new.stock_quantity
        )));
    }
    if new.min_stock_level < 0 {
        return Err(Error::check_range(format!(
            "products.min_stock_level {} must be non-negative",
            new.min_stock_level
        )));
    }

    if Product::find()
        .filter(product::Column::Sku.eq(new.sku.trim()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::unique(format!(
            "products.sku `{}` is already taken",
            new.sku.trim()
        )));
    }
    if Category::find_by_id(new.category_id).one(db).await?.is_none() {
        return Err(Error::foreign_key(format!(
            "products.category_id references missing category {}",
            new.category_id
        )));
    }

    let row = product::ActiveModel {
        name: Set(new.name.trim().to_string()),
        description: Set(new.description),
        category_id: Set(new.category_id),
        sku: Set(new.sku.trim().to_string()),
        price: Set(new.price),
        cost_price: Set(new.cost_price),
        stock_quantity: Set(new.stock_quantity),
        min_stock_level: Set(new.min_stock_level),
        status: Set(product::ProductStatus::Active),
        rating_average: Set(0.0),
        rating_count: Set(0),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Retrieves a product by id.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Changes the sale price of an existing product.
///
/// Open orders are unaffected: order items carry a price snapshot.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] for a non-positive price,
/// [`Error::NotFound`] if the product does not exist.
pub async fn update_price(
    db: &DatabaseConnection,
    product_id: i64,
    new_price: i64,
) -> Result<product::Model> {
    if new_price <= 0 {
        return Err(Error::check_range(format!(
            "products.price {new_price} cents must be positive"
        )));
    }
    let row = require_product(db, product_id).await?;
    let mut row: product::ActiveModel = row.into();
    row.price = Set(new_price);
    row.update(db).await.map_err(Into::into)
}

/// Adjusts the stock level by a delta (restock positive, sale negative).
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] if the stock would go negative,
/// [`Error::NotFound`] if the product does not exist.
pub async fn adjust_stock(
    db: &DatabaseConnection,
    product_id: i64,
    delta: i32,
) -> Result<product::Model> {
    let row = require_product(db, product_id).await?;
    let level = row.stock_quantity + delta;
    if level < 0 {
        return Err(Error::check_range(format!(
            "products.stock_quantity would become {level}, must stay non-negative"
        )));
    }
    let mut row: product::ActiveModel = row.into();
    row.stock_quantity = Set(level);
    row.update(db).await.map_err(Into::into)
}

async fn require_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    get_product_by_id(db, product_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "product",
            id: product_id,
        })
}
