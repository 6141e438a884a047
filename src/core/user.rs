//! User business logic - Handles all user account operations.
//!
//! Provides functions for creating users and updating the slow-moving account
//! fields (status, loyalty points, lifetime spending). Uniqueness of username
//! and email is validated here, before the row is written, so callers get a
//! typed constraint error instead of a driver error.

use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, prelude::DateTimeUtc};
use sea_orm::{ConnectionTrait, DatabaseConnection};

use crate::entities::{User, user};
use crate::errors::{Error, Result};

/// Field values for a new user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: String,
    pub billing_address: String,
    pub registration_date: DateTimeUtc,
}

/// Creates a new user account, validating field values and uniqueness first.
///
/// New accounts start `Active` with zero loyalty points and zero lifetime
/// spending.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] when the username or email is empty
/// or already taken.
pub async fn create_user(db: &DatabaseConnection, new: NewUser) -> Result<user::Model> {
    if new.username.trim().is_empty() {
        return Err(Error::check_range("users.username must be non-empty"));
    }
    if new.email.trim().is_empty() {
        return Err(Error::check_range("users.email must be non-empty"));
    }

    if find_by_username(db, new.username.trim()).await?.is_some() {
        return Err(Error::unique(format!(
            "users.username `{}` is already taken",
            new.username.trim()
        )));
    }
    if User::find()
        .filter(user::Column::Email.eq(new.email.trim()))
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::unique(format!(
            "users.email `{}` is already taken",
            new.email.trim()
        )));
    }

    let account = user::ActiveModel {
        username: Set(new.username.trim().to_string()),
        email: Set(new.email.trim().to_string()),
        first_name: Set(new.first_name),
        last_name: Set(new.last_name),
        status: Set(user::AccountStatus::Active),
        loyalty_points: Set(0),
        total_spent: Set(0),
        shipping_address: Set(new.shipping_address),
        billing_address: Set(new.billing_address),
        registration_date: Set(new.registration_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    account.insert(db).await.map_err(Into::into)
}

/// Retrieves a user by id.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by username.
pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Changes the account status of an existing user.
///
/// # Errors
/// Returns [`Error::NotFound`] if the user does not exist.
pub async fn update_status(
    db: &DatabaseConnection,
    user_id: i64,
    status: user::AccountStatus,
) -> Result<user::Model> {
    let account = require_user(db, user_id).await?;
    let mut account: user::ActiveModel = account.into();
    account.status = Set(status);
    account.update(db).await.map_err(Into::into)
}

/// Adds (or with a negative delta, redeems) loyalty points.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] if the balance would go negative,
/// [`Error::NotFound`] if the user does not exist.
pub async fn add_loyalty_points(
    db: &DatabaseConnection,
    user_id: i64,
    delta: i32,
) -> Result<user::Model> {
    let account = require_user(db, user_id).await?;
    let balance = account.loyalty_points + delta;
    if balance < 0 {
        return Err(Error::check_range(format!(
            "users.loyalty_points would become {balance}, must stay non-negative"
        )));
    }
    let mut account: user::ActiveModel = account.into();
    account.loyalty_points = Set(balance);
    account.update(db).await.map_err(Into::into)
}

/// Adds a settled order's amount to the user's lifetime spending.
///
/// # Errors
/// Returns [`Error::ConstraintViolation`] for a negative amount,
/// [`Error::NotFound`] if the user does not exist.
pub async fn record_spending(
    db: &DatabaseConnection,
    user_id: i64,
    amount_cents: i64,
) -> Result<user::Model> {
    if amount_cents < 0 {
        return Err(Error::check_range(format!(
            "spending amount {amount_cents} cents must be non-negative"
        )));
    }
    let account = require_user(db, user_id).await?;
    let total = account.total_spent + amount_cents;
    let mut account: user::ActiveModel = account.into();
    account.total_spent = Set(total);
    account.update(db).await.map_err(Into::into)
}

async fn require_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::NotFound {
            entity: "user",
            id: user_id,
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::errors::ConstraintKind;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_user_defaults() -> Result<()> {
        let db = setup_test_db().await?;

        let account = create_test_user(&db, "ada").await?;
        assert_eq!(account.username, "ada");
        assert_eq!(account.status, user::AccountStatus::Active);
        assert_eq!(account.loyalty_points, 0);
        assert_eq!(account.total_spent, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_username() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "ada").await?;

        let result = create_test_user(&db, "ada").await;
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
    async fn test_create_user_rejects_duplicate_email() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "ada").await?;

        let mut new = test_new_user("grace");
        new.email = "ada@example.com".to_string();
        let result = create_user(&db, new).await;
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
    async fn test_create_user_rejects_empty_username() -> Result<()> {
        let db = setup_test_db().await?;

        let mut new = test_new_user("ada");
        new.username = "   ".to_string();
        let result = create_user(&db, new).await;
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
    async fn test_update_status() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_user(&db, "ada").await?;

        let updated = update_status(&db, account.id, user::AccountStatus::Suspended).await?;
        assert_eq!(updated.status, user::AccountStatus::Suspended);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_status_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_status(&db, 999, user::AccountStatus::Inactive).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "user",
                id: 999
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_loyalty_points_floor() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_user(&db, "ada").await?;

        let updated = add_loyalty_points(&db, account.id, 120).await?;
        assert_eq!(updated.loyalty_points, 120);

        let updated = add_loyalty_points(&db, account.id, -50).await?;
        assert_eq!(updated.loyalty_points, 70);

        let result = add_loyalty_points(&db, account.id, -100).await;
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
    async fn test_record_spending_accumulates() -> Result<()> {
        let db = setup_test_db().await?;
        let account = create_test_user(&db, "ada").await?;

        record_spending(&db, account.id, 1_998).await?;
        let updated = record_spending(&db, account.id, 4_500).await?;
        assert_eq!(updated.total_spent, 6_498);

        let result = record_spending(&db, account.id, -1).await;
        assert!(result.is_err());

        Ok(())
    }
}
