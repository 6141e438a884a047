//! Reconciliation of denormalized aggregate fields.
//!
//! The store keeps two families of derived fields for read efficiency: product
//! rating statistics and order monetary totals. Review and order-item rows are
//! the source of truth; the passes here recompute the derived fields from
//! those rows and must land on exactly the values a direct computation would
//! produce - any difference is drift and gets repaired. Both passes are
//! idempotent and touch nothing but the derived fields.

use std::collections::HashMap;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing::{debug, info};

use crate::core::order::tax_for;
use crate::entities::{Order, Product, Review, order, order_item, product};
use crate::errors::{Error, Result};

/// Rounds a mean rating to two decimals.
#[must_use]
pub fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Recomputes `rating_count` and `rating_average` for every product from the
/// current review rows. A product with no reviews gets `0` and `0.0`.
///
/// Returns the number of product rows that had drifted and were repaired;
/// running the pass twice in a row therefore returns `0` the second time.
///
/// # Errors
/// Returns [`Error::Database`] on driver failure.
#[allow(clippy::float_cmp, clippy::cast_precision_loss)] // derived fields must match the recomputation exactly
pub async fn reconcile_product_ratings(db: &DatabaseConnection) -> Result<u64> {
    let products = Product::find().all(db).await?;
    let reviews = Review::find().all(db).await?;

    let mut tallies: HashMap<i64, (i32, i64)> = HashMap::new();
    for review in &reviews {
        let tally = tallies.entry(review.product_id).or_insert((0, 0));
        tally.0 += 1;
        tally.1 += i64::from(review.rating);
    }

    let mut repaired = 0u64;
    for model in products {
        let (count, sum) = tallies.get(&model.id).copied().unwrap_or((0, 0));
        let average = if count == 0 {
            0.0
        } else {
            round_rating(sum as f64 / f64::from(count))
        };

        if model.rating_count != count || model.rating_average != average {
            debug!(
                product_id = model.id,
                count, average, "Repairing drifted product rating fields"
            );
            let mut row: product::ActiveModel = model.into();
            row.rating_count = Set(count);
            row.rating_average = Set(average);
            row.update(db).await?;
            repaired += 1;
        }
    }

    info!("Product rating reconciliation complete, {repaired} rows repaired.");
    Ok(repaired)
}

/// Recomputes an order's monetary fields strictly from its current item rows.
///
/// Each line total is re-derived as `quantity * unit_price - discount` and
/// repaired in place if it drifted; the order's subtotal, tax, and grand total
/// are then recomputed from the lines. Used both right after order creation
/// and as a repair operation if items were ever mutated independently.
///
/// # Errors
/// Returns [`Error::NotFound`] for a missing order, [`Error::Database`] on
/// driver failure.
pub async fn reconcile_order_totals(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<order::Model> {
    let placed = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "order",
            id: order_id,
        })?;

    let items = crate::core::order::get_items_for_order(db, order_id).await?;

    let mut subtotal = 0i64;
    for item in items {
        let line_total = i64::from(item.quantity) * item.unit_price - item.discount_amount;
        subtotal += line_total;
        if item.total_price != line_total {
            debug!(
                order_item_id = item.id,
                line_total, "Repairing drifted order item total"
            );
            let mut row: order_item::ActiveModel = item.into();
            row.total_price = Set(line_total);
            row.update(db).await?;
        }
    }

    let tax_amount = tax_for(subtotal);
    let total_amount = subtotal + tax_amount + placed.shipping_cost - placed.discount_amount;

    if placed.subtotal == subtotal
        && placed.tax_amount == tax_amount
        && placed.total_amount == total_amount
    {
        return Ok(placed);
    }

    debug!(order_id, subtotal, total_amount, "Repairing drifted order totals");
    let mut row: order::ActiveModel = placed.into();
    row.subtotal = Set(subtotal);
    row.tax_amount = Set(tax_amount);
    row.total_amount = Set(total_amount);
    row.update(db).await.map_err(Into::into)
}
