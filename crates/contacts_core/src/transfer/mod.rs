//! Bulk transfer building blocks: CSV line codec, progress/cancellation
//! primitives and background job handles.
//!
//! # See also
//! - `repo::contact_csv` for the import/export operations themselves.

pub mod csv_line;
pub mod job;
pub mod progress;
