//! SQLite storage bootstrap and schema management entry points.
//!
//! # Responsibility
//! - Open and configure short-lived SQLite connections for contacts core.
//! - Bring the `contacts` table to the current shape, migrating legacy tables.
//!
//! # Invariants
//! - Every logical operation opens its own connection and drops it on all exit paths.
//! - Application data is not touched before `ensure_schema` has succeeded once.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use migrations::{ensure_schema, MigrationStep, SchemaError, SchemaOutcome};
pub use open::open_db;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
