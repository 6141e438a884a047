//! Unified error types and result handling for the store.
//!
//! Every write path reports constraint problems through [`Error::ConstraintViolation`]
//! with a [`ConstraintKind`] naming the violated rule class, so callers can tell an
//! expected collision (a duplicate review during population) apart from a generator bug.

use std::fmt;

use thiserror::Error;

/// Which class of structural rule an attempted write violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// A uniqueness rule (username, email, SKU, order number, review triple).
    Unique,
    /// A foreign key referenced a row that does not exist.
    ForeignKey,
    /// A field value fell outside its permitted range.
    CheckRange,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => write!(f, "unique"),
            Self::ForeignKey => write!(f, "foreign key"),
            Self::CheckRange => write!(f, "check range"),
        }
    }
}

/// Unified error type for all store, generator, and reporting operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} constraint violated: {rule}")]
    ConstraintViolation {
        /// The class of rule that was violated.
        kind: ConstraintKind,
        /// Human-readable statement of the violated rule.
        rule: String,
    },

    #[error("category {category_id} would create a parent cycle")]
    Cycle { category_id: i64 },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("schema definition conflict: {message}")]
    Schema { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl Error {
    /// Shorthand for a uniqueness violation.
    pub(crate) fn unique(rule: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            kind: ConstraintKind::Unique,
            rule: rule.into(),
        }
    }

    /// Shorthand for a dangling-reference violation.
    pub(crate) fn foreign_key(rule: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            kind: ConstraintKind::ForeignKey,
            rule: rule.into(),
        }
    }

    /// Shorthand for a value-range violation.
    pub(crate) fn check_range(rule: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            kind: ConstraintKind::CheckRange,
            rule: rule.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
