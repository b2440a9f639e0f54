//! Search helpers outside the SQL paging path.
//!
//! # Responsibility
//! - Filter contact lists the UI already holds, with the same name/email
//!   semantics as `ContactRepository::get_page`.

pub mod filter;
