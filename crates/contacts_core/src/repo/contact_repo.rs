//! Contact repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, duplicate-suppressed insert and paged search over `contacts`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - No two rows share `(Name, Email)` through this API; a duplicate insert
//!   returns the existing id and writes nothing.
//! - Keys are compared trimmed. Absent email matches stored NULL or blank email;
//!   present email matches exactly.
//! - Every operation opens its own connection; nothing is cached between calls.
//! - Update and delete of a missing id are silent no-ops.

use crate::db::{ensure_schema, open_db, DbError, SchemaError, SchemaOutcome};
use crate::model::contact::{Contact, ContactId, ContactValidationError};
use crate::model::page::{ContactPage, PageRequest};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const CONTACT_SELECT_SQL: &str = "SELECT Id, Name, Email, Mobile FROM contacts";
const SEARCH_FILTER_SQL: &str = " WHERE Name LIKE ?1 ESCAPE '\\' OR Email LIKE ?1 ESCAPE '\\'";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence, query and bulk transfer.
#[derive(Debug)]
pub enum RepoError {
    /// Import source file does not exist.
    NotFound(PathBuf),
    Schema(SchemaError),
    Db(DbError),
    Io(std::io::Error),
    /// A bulk run stopped at a record boundary. `committed` rows stay applied.
    Cancelled { processed: usize, committed: usize },
    Validation(ContactValidationError),
    InvalidPage { page_number: u32, page_size: u32 },
    /// A background bulk worker panicked before producing a result.
    WorkerPanicked,
}

impl RepoError {
    /// Returns whether this is a storage-level failure (engine or file I/O).
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Db(_) | Self::Io(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "csv file not found: {}", path.display()),
            Self::Schema(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Cancelled {
                processed,
                committed,
            } => write!(
                f,
                "operation cancelled after {processed} records ({committed} committed)"
            ),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidPage {
                page_number,
                page_size,
            } => write!(
                f,
                "invalid page request: page_number={page_number} page_size={page_size}; both must be >= 1"
            ),
            Self::WorkerPanicked => write!(f, "background worker panicked"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Schema(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::NotFound(_)
            | Self::Cancelled { .. }
            | Self::InvalidPage { .. }
            | Self::WorkerPanicked => None,
        }
    }
}

impl From<SchemaError> for RepoError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of a duplicate-checked insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(ContactId),
    Duplicate(ContactId),
}

impl InsertOutcome {
    pub fn id(self) -> ContactId {
        match self {
            Self::Inserted(id) | Self::Duplicate(id) => id,
        }
    }

    pub fn is_inserted(self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Repository interface for contact CRUD and paging.
pub trait ContactRepository {
    fn ensure_schema(&self) -> RepoResult<SchemaOutcome>;
    fn insert(&self, contact: &Contact) -> RepoResult<ContactId>;
    fn get_by_id(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    fn get_by_name_email(&self, name: &str, email: Option<&str>) -> RepoResult<Option<Contact>>;
    fn get_all(&self) -> RepoResult<Vec<Contact>>;
    fn get_page(&self, request: &PageRequest) -> RepoResult<ContactPage>;
    fn update(&self, contact: &Contact) -> RepoResult<()>;
    fn delete(&self, id: ContactId) -> RepoResult<()>;
}

/// SQLite-backed contact repository bound to one database file.
#[derive(Debug, Clone)]
pub struct SqliteContactRepository {
    db_path: PathBuf,
}

impl SqliteContactRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Duplicate-checked insert that also reports whether a row was written.
    pub fn insert_with_outcome(&self, contact: &Contact) -> RepoResult<InsertOutcome> {
        contact.validate()?;
        let mut conn = self.connect()?;
        Ok(insert_if_absent(&mut conn, &contact.normalized())?)
    }

    pub(crate) fn connect(&self) -> RepoResult<Connection> {
        Ok(open_db(&self.db_path)?)
    }
}

impl ContactRepository for SqliteContactRepository {
    fn ensure_schema(&self) -> RepoResult<SchemaOutcome> {
        let mut conn = self.connect()?;
        Ok(ensure_schema(&mut conn)?)
    }

    fn insert(&self, contact: &Contact) -> RepoResult<ContactId> {
        Ok(self.insert_with_outcome(contact)?.id())
    }

    fn get_by_id(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        let conn = self.connect()?;
        let contact = conn
            .query_row(
                &format!("{CONTACT_SELECT_SQL} WHERE Id = ?1;"),
                [id],
                parse_contact_row,
            )
            .optional()?;
        Ok(contact)
    }

    fn get_by_name_email(&self, name: &str, email: Option<&str>) -> RepoResult<Option<Contact>> {
        let conn = self.connect()?;
        Ok(find_by_name_email(&conn, name, email)?)
    }

    fn get_all(&self) -> RepoResult<Vec<Contact>> {
        let conn = self.connect()?;
        Ok(select_all(&conn)?)
    }

    fn get_page(&self, request: &PageRequest) -> RepoResult<ContactPage> {
        if request.page_number == 0 || request.page_size == 0 {
            return Err(RepoError::InvalidPage {
                page_number: request.page_number,
                page_size: request.page_size,
            });
        }

        let conn = self.connect()?;
        let pattern = request.search_term().map(like_contains_pattern);
        let filter = if pattern.is_some() {
            SEARCH_FILTER_SQL
        } else {
            ""
        };

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(1) FROM contacts{filter};"),
            params_from_iter(pattern.iter()),
            |row| row.get(0),
        )?;

        let mut bind_values: Vec<Value> = Vec::new();
        if let Some(pattern) = &pattern {
            bind_values.push(Value::Text(pattern.clone()));
        }
        let limit_index = bind_values.len() + 1;
        bind_values.push(Value::Integer(i64::from(request.page_size)));
        bind_values.push(Value::Integer(
            i64::try_from(request.offset()).unwrap_or(i64::MAX),
        ));

        let mut stmt = conn.prepare(&format!(
            "{CONTACT_SELECT_SQL}{filter} ORDER BY Id DESC LIMIT ?{limit_index} OFFSET ?{};",
            limit_index + 1
        ))?;
        let items = stmt
            .query_map(params_from_iter(bind_values), parse_contact_row)?
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "event=contacts_page module=repo status=ok page_number={} page_size={} filtered={} items={} total={}",
            request.page_number,
            request.page_size,
            pattern.is_some(),
            items.len(),
            total
        );

        Ok(ContactPage {
            items,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    fn update(&self, contact: &Contact) -> RepoResult<()> {
        contact.validate()?;
        let contact = contact.normalized();
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE contacts SET Name = ?1, Email = ?2, Mobile = ?3 WHERE Id = ?4;",
            params![
                contact.name.as_str(),
                contact.email.as_deref(),
                contact.mobile.as_deref(),
                contact.id,
            ],
        )?;
        info!(
            "event=contact_update module=repo status=ok id={} matched={}",
            contact.id, changed
        );
        Ok(())
    }

    fn delete(&self, id: ContactId) -> RepoResult<()> {
        let conn = self.connect()?;
        let changed = conn.execute("DELETE FROM contacts WHERE Id = ?1;", [id])?;
        info!(
            "event=contact_delete module=repo status=ok id={} matched={}",
            id, changed
        );
        Ok(())
    }
}

/// Inserts `contact` unless a row with the same `(name, email)` exists.
///
/// The lookup and the insert share one immediate transaction, so another
/// writer cannot slip a duplicate in between.
pub(crate) fn insert_if_absent(
    conn: &mut Connection,
    contact: &Contact,
) -> rusqlite::Result<InsertOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if let Some(existing) = find_by_name_email(&tx, &contact.name, contact.email.as_deref())? {
        tx.commit()?;
        debug!(
            "event=contact_insert module=repo status=ok duplicate=true id={}",
            existing.id
        );
        return Ok(InsertOutcome::Duplicate(existing.id));
    }

    tx.execute(
        "INSERT INTO contacts (Name, Email, Mobile) VALUES (?1, ?2, ?3);",
        params![
            contact.name.as_str(),
            contact.email.as_deref(),
            contact.mobile.as_deref(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;

    debug!(
        "event=contact_insert module=repo status=ok duplicate=false id={}",
        id
    );
    Ok(InsertOutcome::Inserted(id))
}

pub(crate) fn find_by_name_email(
    conn: &Connection,
    name: &str,
    email: Option<&str>,
) -> rusqlite::Result<Option<Contact>> {
    let name = name.trim();
    let email = email.map(str::trim).filter(|value| !value.is_empty());
    conn.query_row(
        &format!(
            "{CONTACT_SELECT_SQL}
             WHERE Name = ?1
               AND (Email = ?2 OR (?2 IS NULL AND (Email IS NULL OR TRIM(Email) = '')))
             ORDER BY Id ASC
             LIMIT 1;"
        ),
        params![name, email],
        parse_contact_row,
    )
    .optional()
}

pub(crate) fn select_all(conn: &Connection) -> rusqlite::Result<Vec<Contact>> {
    let mut stmt = conn.prepare(&format!("{CONTACT_SELECT_SQL} ORDER BY Id DESC;"))?;
    let contacts = stmt
        .query_map([], parse_contact_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(contacts)
}

fn parse_contact_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    let contact = Contact {
        id: row.get("Id")?,
        name: row.get("Name")?,
        email: row.get("Email")?,
        mobile: row.get("Mobile")?,
    };
    Ok(contact.normalized())
}

/// Builds a `LIKE` pattern matching `term` as a literal substring.
fn like_contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
