//! Core data-access layer for the contacts manager.
//! This crate is the single source of truth for contact persistence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod transfer;

pub use db::{ensure_schema, open_db, DbError, MigrationStep, SchemaError, SchemaOutcome};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::contact::{Contact, ContactId, ContactValidationError};
pub use model::page::{clamp_page_number, total_pages, ContactPage, PageRequest};
pub use model::validation::{is_valid_email, is_valid_mobile};
pub use repo::contact_repo::{
    ContactRepository, InsertOutcome, RepoError, RepoResult, SqliteContactRepository,
};
pub use search::filter::filter_contacts;
pub use service::contact_service::{ContactService, ServedPage};
pub use transfer::csv_line::{escape_csv_field, split_csv_line};
pub use transfer::job::{spawn_export, spawn_import, BulkJob};
pub use transfer::progress::{
    CancellationToken, NoProgress, ProgressSink, ProgressSnapshot, ProgressTracker,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
