//! Contact domain model.
//!
//! # Responsibility
//! - Define the single persisted record of the contact manager.
//! - Normalize optional text so "empty" and "absent" are one state.
//!
//! # Invariants
//! - `name` must be non-blank before any write.
//! - Text fields are trimmed on construction and on every write path.
//! - `email` and `mobile` are never `Some("")`; blank values become `None`.
//! - `id` is assigned by storage and is stable once assigned. `0` marks an
//!   unsaved contact.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned row identity.
pub type ContactId = i64;

/// Identity carried by contacts that have not been persisted yet.
pub const UNSAVED_CONTACT_ID: ContactId = 0;

/// Canonical contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

/// Validation failures for contact writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    BlankName,
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "contact name must not be blank"),
        }
    }
}

impl Error for ContactValidationError {}

impl Contact {
    /// Creates an unsaved contact. Blank `email`/`mobile` collapse to `None`.
    pub fn new(
        name: impl Into<String>,
        email: Option<impl Into<String>>,
        mobile: Option<impl Into<String>>,
    ) -> Self {
        Self::with_id(UNSAVED_CONTACT_ID, name, email, mobile)
    }

    /// Creates a contact carrying an existing storage id.
    ///
    /// Used by update flows where the UI edits a previously loaded row.
    pub fn with_id(
        id: ContactId,
        name: impl Into<String>,
        email: Option<impl Into<String>>,
        mobile: Option<impl Into<String>>,
    ) -> Self {
        Self {
            id,
            name: name.into().trim().to_string(),
            email: normalize_optional(email.map(Into::into)),
            mobile: normalize_optional(mobile.map(Into::into)),
        }
    }

    /// Returns whether storage has assigned an id to this contact.
    pub fn is_saved(&self) -> bool {
        self.id != UNSAVED_CONTACT_ID
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.name.trim().is_empty() {
            return Err(ContactValidationError::BlankName);
        }
        Ok(())
    }

    /// Returns a copy with every field trimmed and blank optionals mapped to `None`.
    ///
    /// Struct literals can bypass the constructors, so write paths call this
    /// before binding parameters.
    pub fn normalized(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.trim().to_string(),
            email: normalize_optional(self.email.clone()),
            mobile: normalize_optional(self.mobile.clone()),
        }
    }
}

/// Trims text and maps blank or whitespace-only values to `None`.
pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
