//! Contacts schema manager.
//!
//! # Responsibility
//! - Create the `contacts` table when it does not exist.
//! - Detect legacy table shapes that lack an `Id` column and rebuild them.
//!
//! # Invariants
//! - Detection and migration run inside one exclusive write transaction.
//! - Any failure rolls the whole sequence back; a migration is never partially applied.
//! - The table name and legacy columns are matched case-insensitively.
//! - Only `Name`, `Email` and `Mobile` are carried over; missing ones stay NULL
//!   in the rebuilt rows.

use log::{error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const CONTACTS_TABLE: &str = "contacts";
const MIGRATION_TABLE: &str = "contacts_new";
const CARRIED_COLUMNS: [&str; 3] = ["Name", "Email", "Mobile"];

/// Step of the schema sequence that was executing when a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    Begin,
    Detect,
    Create,
    Copy,
    DropLegacy,
    Rename,
    Commit,
}

impl MigrationStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Detect => "detect",
            Self::Create => "create",
            Self::Copy => "copy",
            Self::DropLegacy => "drop_legacy",
            Self::Rename => "rename",
            Self::Commit => "commit",
        }
    }
}

/// Schema creation or migration failure, reported after rollback.
#[derive(Debug)]
pub struct SchemaError {
    pub step: MigrationStep,
    pub source: rusqlite::Error,
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "contacts schema sequence failed at step `{}`: {}",
            self.step.as_str(),
            self.source
        )
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// What `ensure_schema` did to reach the current shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// No table existed; a fresh one was created.
    Created,
    /// The table already had an `Id` column.
    Current,
    /// A legacy table was rebuilt with an `Id` column.
    Migrated { rows_copied: usize },
}

impl SchemaOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Current => "current",
            Self::Migrated { .. } => "migrated",
        }
    }
}

/// Ensures the `contacts` table exists with an `Id` primary key.
///
/// Idempotent: a second call on a current schema returns `SchemaOutcome::Current`
/// and performs no DDL.
///
/// # Errors
/// - Returns `SchemaError` naming the failed step. The transaction has already
///   been rolled back, so the existing table (or its absence) is untouched.
pub fn ensure_schema(conn: &mut Connection) -> Result<SchemaOutcome, SchemaError> {
    let started_at = Instant::now();

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Exclusive)
        .map_err(at(MigrationStep::Begin))?;

    let outcome = match run_schema_sequence(&tx) {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=schema_ensure module=db status=error error_code=rollback_failed error={}",
                    rollback_err
                );
            }
            error!(
                "event=schema_ensure module=db status=error step={} duration_ms={} error={}",
                err.step.as_str(),
                started_at.elapsed().as_millis(),
                err.source
            );
            return Err(err);
        }
    };

    tx.commit().map_err(at(MigrationStep::Commit))?;

    match outcome {
        SchemaOutcome::Migrated { rows_copied } => info!(
            "event=schema_ensure module=db status=ok outcome={} rows_copied={} duration_ms={}",
            outcome.as_str(),
            rows_copied,
            started_at.elapsed().as_millis()
        ),
        _ => info!(
            "event=schema_ensure module=db status=ok outcome={} duration_ms={}",
            outcome.as_str(),
            started_at.elapsed().as_millis()
        ),
    }
    Ok(outcome)
}

fn run_schema_sequence(tx: &Transaction<'_>) -> Result<SchemaOutcome, SchemaError> {
    if !table_exists(tx, CONTACTS_TABLE).map_err(at(MigrationStep::Detect))? {
        tx.execute_batch(&create_table_sql(CONTACTS_TABLE))
            .map_err(at(MigrationStep::Create))?;
        return Ok(SchemaOutcome::Created);
    }

    let columns = table_columns(tx, CONTACTS_TABLE).map_err(at(MigrationStep::Detect))?;
    if find_column(&columns, "Id").is_some() {
        return Ok(SchemaOutcome::Current);
    }

    tx.execute_batch(&create_table_sql(MIGRATION_TABLE))
        .map_err(at(MigrationStep::Create))?;

    let mut insert_columns = Vec::new();
    let mut select_columns = Vec::new();
    for wanted in CARRIED_COLUMNS {
        if let Some(legacy) = find_column(&columns, wanted) {
            insert_columns.push(wanted.to_string());
            select_columns.push(quote_identifier(legacy));
        }
    }

    let rows_copied = if insert_columns.is_empty() {
        0
    } else {
        tx.execute(
            &format!(
                "INSERT INTO {MIGRATION_TABLE} ({}) SELECT {} FROM {CONTACTS_TABLE};",
                insert_columns.join(", "),
                select_columns.join(", ")
            ),
            [],
        )
        .map_err(at(MigrationStep::Copy))?
    };

    tx.execute_batch(&format!("DROP TABLE {CONTACTS_TABLE};"))
        .map_err(at(MigrationStep::DropLegacy))?;
    tx.execute_batch(&format!(
        "ALTER TABLE {MIGRATION_TABLE} RENAME TO {CONTACTS_TABLE};"
    ))
    .map_err(at(MigrationStep::Rename))?;

    Ok(SchemaOutcome::Migrated { rows_copied })
}

fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (
            Id INTEGER PRIMARY KEY AUTOINCREMENT,
            Name TEXT NOT NULL,
            Email TEXT,
            Mobile TEXT
        );"
    )
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1 COLLATE NOCASE
        );",
        [table],
        |row| row.get(0),
    )
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn find_column<'a>(columns: &'a [String], wanted: &str) -> Option<&'a str> {
    columns
        .iter()
        .find(|column| column.eq_ignore_ascii_case(wanted))
        .map(String::as_str)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn at(step: MigrationStep) -> impl Fn(rusqlite::Error) -> SchemaError {
    move |source| SchemaError { step, source }
}
