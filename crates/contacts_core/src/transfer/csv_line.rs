//! Line-level CSV codec for contact import/export.
//!
//! # Invariants
//! - Parsing is a simplified splitter: `"` toggles quoted mode and is dropped,
//!   commas split only outside quotes, and no escape sequences are recognized.
//! - Writing quotes a field only when it contains `,`, `"` or `\n`, doubling
//!   embedded quotes. `None` is written as an empty field.

use crate::model::contact::Contact;
use std::borrow::Cow;

/// Splits one CSV line into raw (untrimmed) fields.
///
/// Always returns at least one field; an empty line yields `[""]`.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parses one import line into an unsaved contact.
///
/// Fields are positional `name,email,mobile` and trimmed; missing trailing
/// fields are absent. Returns `None` for blank lines and blank names.
pub fn parse_contact_record(line: &str) -> Option<Contact> {
    if line.trim().is_empty() {
        return None;
    }

    let mut fields = split_csv_line(line).into_iter();
    let name = fields.next()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let email = fields.next().map(|value| value.trim().to_string());
    let mobile = fields.next().map(|value| value.trim().to_string());

    Some(Contact::new(name, email, mobile))
}

/// Escapes one field for export.
pub fn escape_csv_field(value: Option<&str>) -> Cow<'_, str> {
    let Some(value) = value else {
        return Cow::Borrowed("");
    };
    if value.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Formats one contact as an export line, without the line terminator.
pub fn format_contact_record(contact: &Contact) -> String {
    format!(
        "{},{},{}",
        escape_csv_field(Some(contact.name.as_str())),
        escape_csv_field(contact.email.as_deref()),
        escape_csv_field(contact.mobile.as_deref())
    )
}
