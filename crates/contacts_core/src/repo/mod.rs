//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the contact data access contract.
//! - Isolate SQLite queries and CSV file handling from callers.
//!
//! # Invariants
//! - Write paths call `Contact::validate()` before SQL mutations.
//! - Duplicate inserts are a success path, not an error.
//! - Errors propagate unmodified; the repository never retries.

pub mod contact_csv;
pub mod contact_repo;
