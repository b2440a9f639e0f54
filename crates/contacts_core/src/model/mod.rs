//! Domain model for the contact manager.
//!
//! # Responsibility
//! - Define the contact record and paging shapes shared by core and callers.
//! - Provide input predicates the UI uses before calling into core.
//!
//! # Invariants
//! - Every persisted contact is identified by a stable storage-assigned `ContactId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod contact;
pub mod page;
pub mod validation;
