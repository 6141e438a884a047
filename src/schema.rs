//! Schema definition for the store.
//!
//! The SeaORM entity definitions in [`crate::entities`] are the single source of
//! truth for table shapes: `define_schema` derives every `CREATE TABLE` from them
//! with `Schema::create_table_from_entity`, then adds the secondary indexes the
//! read paths depend on. The function is idempotent - re-running it against a
//! database that already carries the expected layout is a no-op - but a table
//! whose column set conflicts with the declared entity is rejected with
//! [`Error::Schema`] before anything is written.

use std::collections::BTreeSet;

use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityName, EntityTrait, IdenStatic, Iterable, Schema,
    Statement,
};
use tracing::{debug, info};

use crate::entities::{category, order, order_item, product, review, user};
use crate::errors::{Error, Result};

/// Creates all entity tables and indexes, verifying the shape of any table that
/// already exists.
///
/// # Errors
/// Returns [`Error::Schema`] if an existing table's column set conflicts with
/// the entity definition, or [`Error::Database`] on driver failure.
pub async fn define_schema(db: &DatabaseConnection) -> Result<()> {
    verify_table_shape(db, user::Entity).await?;
    verify_table_shape(db, category::Entity).await?;
    verify_table_shape(db, product::Entity).await?;
    verify_table_shape(db, order::Entity).await?;
    verify_table_shape(db, order_item::Entity).await?;
    verify_table_shape(db, review::Entity).await?;

    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = vec![
        schema.create_table_from_entity(user::Entity),
        schema.create_table_from_entity(category::Entity),
        schema.create_table_from_entity(product::Entity),
        schema.create_table_from_entity(order::Entity),
        schema.create_table_from_entity(order_item::Entity),
        schema.create_table_from_entity(review::Entity),
    ];
    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    for index in secondary_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    info!("Database schema ensured (6 tables, secondary indexes in place).");
    Ok(())
}

/// Secondary indexes on the high-cardinality lookup fields, plus the composite
/// unique index guarding the review `(user, product, order)` triple.
///
/// Uniqueness of the triple is validated in Rust before every insert because
/// `SQLite` treats a `NULL` order id as distinct in unique indexes; the index
/// here backstops the non-null case.
fn secondary_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .if_not_exists()
            .name("idx_users_email")
            .table(user::Entity)
            .col(user::Column::Email)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_users_registration_date")
            .table(user::Entity)
            .col(user::Column::RegistrationDate)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_products_name")
            .table(product::Entity)
            .col(product::Column::Name)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_orders_total")
            .table(order::Entity)
            .col(order::Column::TotalAmount)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_reviews_date")
            .table(review::Entity)
            .col(review::Column::ReviewDate)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .unique()
            .name("idx_reviews_user_product_order")
            .table(review::Entity)
            .col(review::Column::UserId)
            .col(review::Column::ProductId)
            .col(review::Column::OrderId)
            .to_owned(),
    ]
}

/// Compares an existing table's columns against the entity definition.
///
/// A missing table passes (creation handles it); a table with a different
/// column set is a conflicting redefinition.
async fn verify_table_shape<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let table = entity.table_name();
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            format!("PRAGMA table_info(\"{table}\")"),
        ))
        .await?;
    if rows.is_empty() {
        debug!("Table `{table}` absent, will be created.");
        return Ok(());
    }

    let existing: BTreeSet<String> = rows
        .iter()
        .map(|row| row.try_get::<String>("", "name"))
        .collect::<std::result::Result<_, _>>()?;
    let declared: BTreeSet<String> = E::Column::iter()
        .map(|column| column.as_str().to_owned())
        .collect();

    if existing == declared {
        Ok(())
    } else {
        Err(Error::Schema {
            message: format!(
                "table `{table}` already exists with columns {existing:?}, entity declares {declared:?}"
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Category, Order, OrderItem, Product, Review, User};
    use sea_orm::{Database, QuerySelect};

    #[tokio::test]
    async fn test_define_schema_creates_all_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        define_schema(&db).await?;

        // Every table is queryable once the schema is defined.
        let _ = User::find().limit(1).all(&db).await?;
        let _ = Category::find().limit(1).all(&db).await?;
        let _ = Product::find().limit(1).all(&db).await?;
        let _ = Order::find().limit(1).all(&db).await?;
        let _ = OrderItem::find().limit(1).all(&db).await?;
        let _ = Review::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_define_schema_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        define_schema(&db).await?;
        define_schema(&db).await?;

        let _ = User::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_define_schema_rejects_conflicting_table() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "CREATE TABLE users (id INTEGER PRIMARY KEY, nickname TEXT)".to_owned(),
        ))
        .await?;

        let result = define_schema(&db).await;
        assert!(matches!(result, Err(Error::Schema { message: _ })));
        Ok(())
    }
}
