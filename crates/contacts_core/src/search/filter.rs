//! In-memory contact filter for already-loaded lists.
//!
//! # Invariants
//! - The query is trimmed and compared case-insensitively against name and email.
//! - A blank query keeps every item; input order is preserved.

use crate::model::contact::Contact;

/// Returns the contacts whose name or email contains `query`.
pub fn filter_contacts<'a>(items: &'a [Contact], query: &str) -> Vec<&'a Contact> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|contact| {
            contact.name.to_lowercase().contains(&needle)
                || contact
                    .email
                    .as_deref()
                    .is_some_and(|email| email.to_lowercase().contains(&needle))
        })
        .collect()
}
