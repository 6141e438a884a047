//! Order business logic - Places orders and owns the order total arithmetic.
//!
//! An order and its items are one unit: they are written in a single database
//! transaction, and the order row is inserted with its totals already computed
//! from the items, so no reader can ever observe an order with missing items
//! or unreconciled totals. Each item's `unit_price`, `product_name`, and
//! `product_sku` are snapshots of the product row at placement time.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait, prelude::DateTimeUtc,
};

use crate::entities::{Order, OrderItem, Product, User, order, order_item};
use crate::errors::{Error, Result};

/// Fixed sales tax applied to every order subtotal, in percent.
pub const TAX_RATE_PERCENT: i64 = 10;

/// Tax on a subtotal in cents, rounded half-up to the nearest cent.
#[must_use]
pub fn tax_for(subtotal: i64) -> i64 {
    (subtotal * TAX_RATE_PERCENT + 50) / 100
}

/// One line of an order being placed.
#[derive(Debug, Clone)]
pub struct ItemDraft {
    pub product_id: i64,
    pub quantity: i32,
    /// Line-level discount in cents
    pub discount_amount: i64,
}

/// Everything needed to place an order. Totals are not part of the draft -
/// they are always computed from the items.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: i64,
    pub order_number: String,
    pub status: order::OrderStatus,
    pub order_date: DateTimeUtc,
    /// Shipping charge in cents
    pub shipping_cost: i64,
    /// Order-level discount in cents
    pub discount_amount: i64,
    pub payment_method: order::PaymentMethod,
    pub payment_status: order::PaymentStatus,
    pub items: Vec<ItemDraft>,
}

/// Places an order: validates the draft, snapshots product data into the
/// items, computes totals, and writes the order plus all items atomically.
///
/// Totals follow the store arithmetic exactly: each line is
/// `quantity * unit_price - discount`, the subtotal is the sum of lines, tax
/// is [`TAX_RATE_PERCENT`] of the subtotal, and the grand total is
/// `subtotal + tax + shipping - discount`.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] for an empty draft, non-positive
/// quantities, negative charges, a taken order number, or a dangling user or
/// product reference. Nothing is written on error.
pub async fn place_order(
    db: &DatabaseConnection,
    draft: OrderDraft,
) -> Result<(order::Model, Vec<order_item::Model>)> {
    if draft.items.is_empty() {
        return Err(Error::check_range("orders must contain at least one item"));
    }
    if draft.order_number.trim().is_empty() {
        return Err(Error::check_range("orders.order_number must be non-empty"));
    }
    if draft.shipping_cost < 0 {
        return Err(Error::check_range(format!(
            "orders.shipping_cost {} cents must be non-negative",
            draft.shipping_cost
        )));
    }
    if draft.discount_amount < 0 {
        return Err(Error::check_range(format!(
            "orders.discount_amount {} cents must be non-negative",
            draft.discount_amount
        )));
    }

    let txn = db.begin().await?;

    let customer = User::find_by_id(draft.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            Error::foreign_key(format!(
                "orders.user_id references missing user {}",
                draft.user_id
            ))
        })?;

    if Order::find()
        .filter(order::Column::OrderNumber.eq(draft.order_number.trim()))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(Error::unique(format!(
            "orders.order_number `{}` is already taken",
            draft.order_number.trim()
        )));
    }

    // Snapshot each product and compute line totals.
    let mut lines = Vec::with_capacity(draft.items.len());
    let mut subtotal: i64 = 0;
    for item in &draft.items {
        if item.quantity <= 0 {
            return Err(Error::check_range(format!(
                "order_items.quantity {} must be positive",
                item.quantity
            )));
        }
        if item.discount_amount < 0 {
            return Err(Error::check_range(format!(
                "order_items.discount_amount {} cents must be non-negative",
                item.discount_amount
            )));
        }
        let product = Product::find_by_id(item.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                Error::foreign_key(format!(
                    "order_items.product_id references missing product {}",
                    item.product_id
                ))
            })?;

        let total_price = i64::from(item.quantity) * product.price - item.discount_amount;
        if total_price < 0 {
            return Err(Error::check_range(format!(
                "order_items.total_price would be {total_price} cents, discount exceeds the line"
            )));
        }
        subtotal += total_price;
        lines.push((product, item.quantity, item.discount_amount, total_price));
    }

    let tax_amount = tax_for(subtotal);
    let total_amount = subtotal + tax_amount + draft.shipping_cost - draft.discount_amount;

    let placed = order::ActiveModel {
        user_id: Set(draft.user_id),
        order_number: Set(draft.order_number.trim().to_string()),
        status: Set(draft.status),
        order_date: Set(draft.order_date),
        subtotal: Set(subtotal),
        tax_amount: Set(tax_amount),
        shipping_cost: Set(draft.shipping_cost),
        discount_amount: Set(draft.discount_amount),
        total_amount: Set(total_amount),
        payment_method: Set(draft.payment_method),
        payment_status: Set(draft.payment_status),
        shipping_address: Set(customer.shipping_address),
        billing_address: Set(customer.billing_address),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (product, quantity, discount_amount, total_price) in lines {
        let line = order_item::ActiveModel {
            order_id: Set(placed.id),
            product_id: Set(product.id),
            quantity: Set(quantity),
            unit_price: Set(product.price),
            discount_amount: Set(discount_amount),
            total_price: Set(total_price),
            product_name: Set(product.name),
            product_sku: Set(product.sku),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        items.push(line);
    }

    txn.commit().await?;
    Ok((placed, items))
}

/// Retrieves an order by id.
pub async fn get_order_by_id(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Option<order::Model>> {
    Order::find_by_id(order_id).one(db).await.map_err(Into::into)
}

/// Retrieves the item rows of an order, in insertion order.
pub async fn get_items_for_order<C: ConnectionTrait>(
    db: &C,
    order_id: i64,
) -> Result<Vec<order_item::Model>> {
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes the fulfillment status of an existing order. Cancellation is a
/// status change; rows are never removed.
///
/// # Errors
/// Returns [`Error::NotFound`] if the order does not exist.
pub async fn update_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: order::OrderStatus,
) -> Result<order::Model> {
    let row = get_order_by_id(db, order_id).await?.ok_or(Error::NotFound {
        entity: "order",
        id: order_id,
    })?;
    let mut row: order::ActiveModel = row.into();
    row.status = Set(status);
    row.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ConstraintKind;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_place_order_reference_arithmetic() -> Result<()> {
        // Two lines of 19.98 and 45.00, 10% tax, 7.99 shipping.
        let (db, user, category) = setup_with_user_and_category().await?;
        let mut mug = test_new_product("Ferris Mug", category.id);
        mug.price = 999;
        mug.sku = "FER-MUG-1111".to_string();
        let mug = crate::core::product::create_product(&db, mug).await?;
        let mut hoodie = test_new_product("Crab Hoodie", category.id);
        hoodie.price = 4_500;
        hoodie.sku = "CRA-HOO-2222".to_string();
        let hoodie = crate::core::product::create_product(&db, hoodie).await?;

        let (placed, items) = place_order(
            &db,
            test_order_draft(
                user.id,
                "ORD-TEST0001",
                799,
                vec![
                    ItemDraft {
                        product_id: mug.id,
                        quantity: 2,
                        discount_amount: 0,
                    },
                    ItemDraft {
                        product_id: hoodie.id,
                        quantity: 1,
                        discount_amount: 0,
                    },
                ],
            ),
        )
        .await?;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].total_price, 1_998);
        assert_eq!(items[1].total_price, 4_500);
        assert_eq!(placed.subtotal, 6_498);
        assert_eq!(placed.tax_amount, 650);
        assert_eq!(placed.shipping_cost, 799);
        assert_eq!(placed.total_amount, 7_947);

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_snapshots_product_data() -> Result<()> {
        let (db, user, category) = setup_with_user_and_category().await?;
        let product = create_test_product(&db, "Ferris Mug", category.id).await?;

        let (_, items) = place_order(
            &db,
            test_order_draft(
                user.id,
                "ORD-TEST0002",
                599,
                vec![ItemDraft {
                    product_id: product.id,
                    quantity: 1,
                    discount_amount: 0,
                }],
            ),
        )
        .await?;

        // A later price change must not rewrite the placed order.
        crate::core::product::update_price(&db, product.id, 9_999).await?;
        let line = OrderItem::find_by_id(items[0].id).one(&db).await?.unwrap();
        assert_eq!(line.unit_price, product.price);
        assert_eq!(line.product_name, "Ferris Mug");
        assert_eq!(line.product_sku, product.sku);

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_rejects_missing_user() -> Result<()> {
        let (db, category) = setup_with_category().await?;
        let product = create_test_product(&db, "Ferris Mug", category.id).await?;

        let result = place_order(
            &db,
            test_order_draft(
                999,
                "ORD-TEST0003",
                599,
                vec![ItemDraft {
                    product_id: product.id,
                    quantity: 1,
                    discount_amount: 0,
                }],
            ),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ConstraintViolation {
                kind: ConstraintKind::ForeignKey,
                rule: _
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_atomicity_on_missing_product() -> Result<()> {
        let (db, user, category) = setup_with_user_and_category().await?;
        let product = create_test_product(&db, "Ferris Mug", category.id).await?;

        let result = place_order(
            &db,
            test_order_draft(
                user.id,
                "ORD-TEST0004",
                599,
                vec![
                    ItemDraft {
                        product_id: product.id,
                        quantity: 1,
                        discount_amount: 0,
                    },
                    ItemDraft {
                        product_id: 999,
                        quantity: 1,
                        discount_amount: 0,
                    },
                ],
            ),
        )
        .await;
        assert!(result.is_err());

        // The failed order left nothing behind.
        assert_eq!(Order::find().count(&db).await?, 0);
        assert_eq!(OrderItem::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_rejects_zero_quantity() -> Result<()> {
        let (db, user, category) = setup_with_user_and_category().await?;
        let product = create_test_product(&db, "Ferris Mug", category.id).await?;

        let result = place_order(
            &db,
            test_order_draft(
                user.id,
                "ORD-TEST0005",
                599,
                vec![ItemDraft {
                    product_id: product.id,
                    quantity: 0,
                    discount_amount: 0,
                }],
            ),
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ConstraintViolation {
                kind: ConstraintKind::CheckRange,
                rule: _
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_rejects_empty_items() -> Result<()> {
        let (db, user, _) = setup_with_user_and_category().await?;

        let result = place_order(
            &db,
            test_order_draft(user.id, "ORD-TEST0006", 599, vec![]),
        )
        .await;
        assert!(result.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_place_order_rejects_duplicate_order_number() -> Result<()> {
        let (db, user, category) = setup_with_user_and_category().await?;
        let product = create_test_product(&db, "Ferris Mug", category.id).await?;
        let draft = test_order_draft(
            user.id,
            "ORD-TEST0007",
            599,
            vec![ItemDraft {
                product_id: product.id,
                quantity: 1,
                discount_amount: 0,
            }],
        );

        place_order(&db, draft.clone()).await?;
        let result = place_order(&db, draft).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ConstraintViolation {
                kind: ConstraintKind::Unique,
                rule: _
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_models_cancellation() -> Result<()> {
        let (db, user, category) = setup_with_user_and_category().await?;
        let product = create_test_product(&db, "Ferris Mug", category.id).await?;
        let (placed, _) = place_order(
            &db,
            test_order_draft(
                user.id,
                "ORD-TEST0008",
                599,
                vec![ItemDraft {
                    product_id: product.id,
                    quantity: 1,
                    discount_amount: 0,
                }],
            ),
        )
        .await?;

        let cancelled = update_status(&db, placed.id, order::OrderStatus::Cancelled).await?;
        assert_eq!(cancelled.status, order::OrderStatus::Cancelled);
        // Items survive a cancellation.
        assert_eq!(get_items_for_order(&db, placed.id).await?.len(), 1);

        Ok(())
    }

    #[test]
    fn test_tax_rounding() {
        assert_eq!(tax_for(6_498), 650);
        assert_eq!(tax_for(0), 0);
        assert_eq!(tax_for(10), 1);
        assert_eq!(tax_for(4), 0);
        assert_eq!(tax_for(5), 1);
    }
}
