//! Database configuration module.
//!
//! Handles the `SQLite` connection used by the store. The connection string
//! comes from `DATABASE_URL`, falling back to a local file database; tests use
//! `sqlite::memory:` for isolation.

use sea_orm::{Database, DatabaseConnection};
use tracing::debug;

use crate::errors::Result;

const DEFAULT_DATABASE_URL: &str = "sqlite://shopforge.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// # Errors
/// Returns an error if the connection cannot be opened.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}
