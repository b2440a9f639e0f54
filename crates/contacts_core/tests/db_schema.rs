use contacts_core::db::{ensure_schema, open_db, MigrationStep, SchemaOutcome};
use contacts_core::{ContactRepository, RepoError, SqliteContactRepository};
use rusqlite::Connection;
use std::path::Path;

#[test]
fn ensure_schema_creates_missing_table() {
    let dir = tempfile::tempdir().unwrap();
    let mut conn = open_db(dir.path().join("contacts.db")).unwrap();

    assert_eq!(ensure_schema(&mut conn).unwrap(), SchemaOutcome::Created);
    assert_eq!(
        column_names(&conn, "contacts"),
        vec!["Id", "Name", "Email", "Mobile"]
    );
}

#[test]
fn ensure_schema_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contacts.db");

    let mut conn = open_db(&path).unwrap();
    ensure_schema(&mut conn).unwrap();
    let ddl_before = table_sql(&conn, "contacts");
    drop(conn);

    let mut conn = open_db(&path).unwrap();
    assert_eq!(ensure_schema(&mut conn).unwrap(), SchemaOutcome::Current);
    assert_eq!(table_sql(&conn, "contacts"), ddl_before);
    assert_eq!(table_count(&conn), 1);
}

#[test]
fn legacy_table_without_id_and_mobile_is_migrated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed(
        &path,
        "CREATE TABLE contacts (Name TEXT NOT NULL, Email TEXT);
         INSERT INTO contacts (Name, Email) VALUES ('Alice', 'alice@example.com');
         INSERT INTO contacts (Name, Email) VALUES ('Bob', NULL);",
    );

    let mut conn = open_db(&path).unwrap();
    assert_eq!(
        ensure_schema(&mut conn).unwrap(),
        SchemaOutcome::Migrated { rows_copied: 2 }
    );

    assert_eq!(
        column_names(&conn, "contacts"),
        vec!["Id", "Name", "Email", "Mobile"]
    );
    assert!(!table_exists(&conn, "contacts_new"));

    let rows: Vec<(i64, String, Option<String>, Option<String>)> = conn
        .prepare("SELECT Id, Name, Email, Mobile FROM contacts ORDER BY Id;")
        .unwrap()
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            (1, "Alice".to_string(), Some("alice@example.com".to_string()), None),
            (2, "Bob".to_string(), None, None),
        ]
    );
}

#[test]
fn legacy_columns_are_matched_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed(
        &path,
        "CREATE TABLE contacts (name TEXT, EMAIL TEXT, mobile TEXT, notes TEXT);
         INSERT INTO contacts VALUES ('Carol', 'carol@example.com', '5551234', 'ignored');",
    );

    let repo = SqliteContactRepository::new(&path);
    assert_eq!(
        repo.ensure_schema().unwrap(),
        SchemaOutcome::Migrated { rows_copied: 1 }
    );

    let all = repo.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Carol");
    assert_eq!(all[0].email.as_deref(), Some("carol@example.com"));
    assert_eq!(all[0].mobile.as_deref(), Some("5551234"));
}

#[test]
fn legacy_table_name_is_matched_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed(
        &path,
        "CREATE TABLE Contacts (Name TEXT NOT NULL, Email TEXT);
         INSERT INTO Contacts (Name, Email) VALUES ('Dana', 'dana@example.com');",
    );

    let mut conn = open_db(&path).unwrap();
    assert_eq!(
        ensure_schema(&mut conn).unwrap(),
        SchemaOutcome::Migrated { rows_copied: 1 }
    );
    assert!(table_exists(&conn, "contacts"));
    assert!(!table_exists(&conn, "Contacts"));
    assert_eq!(
        column_names(&conn, "contacts"),
        vec!["Id", "Name", "Email", "Mobile"]
    );
    assert_eq!(ensure_schema(&mut conn).unwrap(), SchemaOutcome::Current);
}

#[test]
fn legacy_table_with_lowercase_id_is_current() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed(
        &path,
        "CREATE TABLE contacts (id INTEGER PRIMARY KEY, Name TEXT NOT NULL, Email TEXT, Mobile TEXT);",
    );

    let mut conn = open_db(&path).unwrap();
    assert_eq!(ensure_schema(&mut conn).unwrap(), SchemaOutcome::Current);
}

#[test]
fn legacy_table_without_known_columns_is_rebuilt_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed(
        &path,
        "CREATE TABLE contacts (Phone TEXT);
         INSERT INTO contacts VALUES ('555');",
    );

    let mut conn = open_db(&path).unwrap();
    assert_eq!(
        ensure_schema(&mut conn).unwrap(),
        SchemaOutcome::Migrated { rows_copied: 0 }
    );
    assert_eq!(
        column_names(&conn, "contacts"),
        vec!["Id", "Name", "Email", "Mobile"]
    );
}

#[test]
fn failed_migration_rolls_back_and_keeps_legacy_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed(
        &path,
        "CREATE TABLE contacts (Name TEXT, Email TEXT);
         INSERT INTO contacts VALUES ('Alice', 'alice@example.com');
         INSERT INTO contacts VALUES (NULL, 'orphan@example.com');",
    );

    let mut conn = open_db(&path).unwrap();
    let err = ensure_schema(&mut conn).unwrap_err();
    assert_eq!(err.step, MigrationStep::Copy);
    drop(conn);

    let conn = Connection::open(&path).unwrap();
    assert_eq!(column_names(&conn, "contacts"), vec!["Name", "Email"]);
    assert!(!table_exists(&conn, "contacts_new"));
    let rows: i64 = conn
        .query_row("SELECT COUNT(1) FROM contacts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 2);
}

#[test]
fn repository_reports_schema_failures_as_schema_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    seed(
        &path,
        "CREATE TABLE contacts (Name TEXT);
         INSERT INTO contacts VALUES (NULL);",
    );

    let err = SqliteContactRepository::new(&path)
        .ensure_schema()
        .unwrap_err();
    assert!(matches!(err, RepoError::Schema(ref schema) if schema.step == MigrationStep::Copy));
    assert!(!err.is_storage());
}

fn seed(path: &Path, sql: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(sql).unwrap();
}

fn column_names(conn: &Connection, table: &str) -> Vec<String> {
    conn.prepare(&format!("PRAGMA table_info({table});"))
        .unwrap()
        .query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1);",
        [table],
        |row| row.get(0),
    )
    .unwrap()
}

fn table_sql(conn: &Connection, table: &str) -> String {
    conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table],
        |row| row.get(0),
    )
    .unwrap()
}

fn table_count(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%';",
        [],
        |row| row.get(0),
    )
    .unwrap()
}
