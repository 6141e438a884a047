//! Review business logic - Submits reviews and enforces triple uniqueness.
//!
//! A review references a user and a product, and optionally the order the
//! purchase was made in. The `(user, product, order)` triple is unique, and a
//! missing order counts as a value: the check runs in Rust before the insert
//! because `SQLite`'s unique index treats `NULL` values as distinct.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    prelude::DateTimeUtc,
};

use crate::entities::{Order, Product, Review, User, review};
use crate::errors::{Error, Result};

/// Field values for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: i64,
    pub user_id: i64,
    pub order_id: Option<i64>,
    /// Star rating in [1, 5]
    pub rating: i32,
    pub title: Option<String>,
    pub body: Option<String>,
    pub verified_purchase: bool,
    pub status: review::ReviewStatus,
    pub review_date: DateTimeUtc,
}

/// Submits a review, validating the rating range, every reference, and the
/// uniqueness of the `(user, product, order)` triple before the row is
/// written.
///
/// The new row does not touch the product's derived rating fields; a
/// [`crate::core::reconcile::reconcile_product_ratings`] pass folds it in.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] naming the violated rule.
pub async fn create_review(db: &DatabaseConnection, new: NewReview) -> Result<review::Model> {
    if !(1..=5).contains(&new.rating) {
        return Err(Error::check_range(format!(
            "reviews.rating {} must be within 1..=5",
            new.rating
        )));
    }

    if Product::find_by_id(new.product_id).one(db).await?.is_none() {
        return Err(Error::foreign_key(format!(
            "reviews.product_id references missing product {}",
            new.product_id
        )));
    }
    if User::find_by_id(new.user_id).one(db).await?.is_none() {
        return Err(Error::foreign_key(format!(
            "reviews.user_id references missing user {}",
            new.user_id
        )));
    }
    if let Some(order_id) = new.order_id {
        if Order::find_by_id(order_id).one(db).await?.is_none() {
            return Err(Error::foreign_key(format!(
                "reviews.order_id references missing order {order_id}"
            )));
        }
    }

    if find_by_triple(db, new.user_id, new.product_id, new.order_id)
        .await?
        .is_some()
    {
        return Err(Error::unique(format!(
            "reviews triple (user {}, product {}, order {:?}) already exists",
            new.user_id, new.product_id, new.order_id
        )));
    }

    let row = review::ActiveModel {
        product_id: Set(new.product_id),
        user_id: Set(new.user_id),
        order_id: Set(new.order_id),
        rating: Set(new.rating),
        title: Set(new.title),
        body: Set(new.body),
        verified_purchase: Set(new.verified_purchase),
        status: Set(new.status),
        review_date: Set(new.review_date),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}

/// Finds the review written by a user for a product within an order, if any.
pub async fn find_by_triple(
    db: &DatabaseConnection,
    user_id: i64,
    product_id: i64,
    order_id: Option<i64>,
) -> Result<Option<review::Model>> {
    let mut query = Review::find()
        .filter(review::Column::UserId.eq(user_id))
        .filter(review::Column::ProductId.eq(product_id));
    query = match order_id {
        Some(order_id) => query.filter(review::Column::OrderId.eq(order_id)),
        None => query.filter(review::Column::OrderId.is_null()),
    };
    query.one(db).await.map_err(Into::into)
}

/// Changes the moderation status of an existing review.
///
/// # Errors
/// Returns [`Error::NotFound`] if the review does not exist.
pub async fn update_status(
    db: &DatabaseConnection,
    review_id: i64,
    status: review::ReviewStatus,
) -> Result<review::Model> {
    let row = Review::find_by_id(review_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "review",
            id: review_id,
        })?;
    let mut row: review::ActiveModel = row.into();
    row.status = Set(status);
    row.update(db).await.map_err(Into::into)
}
