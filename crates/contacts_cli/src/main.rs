//! Command-line front end for `contacts_core`.
//!
//! # Responsibility
//! - Stand in for the form layer: validate input, run one command, print the result.
//! - Run CSV transfers as background jobs and render progress with an ETA.
//!
//! # Configuration
//! - `--db` / `CONTACTS_DB`, default `contacts.sqlite3` in the working directory.
//! - `--log-dir` / `CONTACTS_LOG_DIR` (absolute) enables file logging;
//!   `--log-level` / `CONTACTS_LOG_LEVEL` overrides the build-mode default.

use clap::{Parser, Subcommand};
use contacts_core::{
    core_version, default_log_level, init_logging, is_valid_email, is_valid_mobile,
    spawn_export, spawn_import, total_pages, Contact, ContactId, ContactService, InsertOutcome,
    PageRequest, ProgressSnapshot, ProgressTracker, RepoError, SqliteContactRepository,
};
use log::warn;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "contacts")]
#[command(about = "Manage a SQLite contact list with CSV import/export")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the contacts database
    #[arg(long, env = "CONTACTS_DB", default_value = "contacts.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "CONTACTS_LOG_DIR")]
    log_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "CONTACTS_LOG_LEVEL")]
    log_level: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Commands {
    /// List one page of contacts, newest first
    List {
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..))]
        size: u32,

        /// Case-insensitive substring of name or email
        #[arg(long)]
        search: Option<String>,
    },

    /// Add a contact unless the same name and email already exist
    Add {
        name: String,
        email: Option<String>,
        mobile: Option<String>,
    },

    /// Overwrite every field of an existing contact
    Update {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        id: ContactId,
        name: String,
        email: Option<String>,
        mobile: Option<String>,
    },

    /// Delete a contact by id
    Delete {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        id: ContactId,
    },

    /// Import `name,email,mobile` lines from a CSV file
    Import { path: PathBuf },

    /// Export all contacts to a CSV file, overwriting it
    Export { path: PathBuf },

    /// Print the core library version
    Version,
}

#[derive(Debug)]
enum CliError {
    InvalidInput(String),
    Repo(RepoError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::Repo(RepoError::Cancelled { committed, .. }) => {
                write!(f, "cancelled; {committed} records were already applied")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_cli_logging(cli.log_dir.as_deref(), cli.log_level.as_deref());

    match run(cli.db, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_cli_logging(log_dir: Option<&str>, level: Option<&str>) {
    let Some(log_dir) = log_dir else {
        return;
    };
    if let Err(err) = init_logging(level.unwrap_or(default_log_level()), log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }
}

fn run(db_path: PathBuf, command: Commands) -> Result<(), CliError> {
    if command == Commands::Version {
        println!("contacts_core version={}", core_version());
        return Ok(());
    }

    let service = ContactService::new(SqliteContactRepository::new(db_path));
    service.ensure_schema()?;

    match command {
        Commands::List { page, size, search } => {
            let mut request = PageRequest::new(page, size);
            request.search = search;
            let served = service.get_page_clamped(&request)?;
            println!(
                "page {} of {} ({} matching)",
                served.page_number,
                total_pages(served.page.total, size),
                served.page.total
            );
            for contact in &served.page.items {
                println!(
                    "{}\t{}\t{}\t{}",
                    contact.id,
                    contact.name,
                    contact.email.as_deref().unwrap_or("-"),
                    contact.mobile.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Add {
            name,
            email,
            mobile,
        } => {
            let contact = validated_contact(0, name, email, mobile)?;
            match service.repository().insert_with_outcome(&contact)? {
                InsertOutcome::Inserted(id) => println!("added contact {id}"),
                InsertOutcome::Duplicate(id) => {
                    println!("contact already exists with id {id}; nothing added")
                }
            }
        }
        Commands::Update {
            id,
            name,
            email,
            mobile,
        } => {
            if service.get_by_id(id)?.is_none() {
                return Err(CliError::InvalidInput(format!("no contact with id {id}")));
            }
            let contact = validated_contact(id, name, email, mobile)?;
            service.update(&contact)?;
            println!("updated contact {id}");
        }
        Commands::Delete { id } => {
            service.delete(id)?;
            println!("deleted contact {id}");
        }
        Commands::Import { path } => {
            let total = count_lines(&path)?;
            let (tx, rx) = mpsc::channel();
            let job = spawn_import(service.repository().clone(), &path, tx)?;
            show_progress("processed", total, rx);
            let inserted = job.join()?;
            println!("imported {inserted} contacts from {}", path.display());
        }
        Commands::Export { path } => {
            let total = service.get_page(&PageRequest::new(1, 1))?.total;
            let (tx, rx) = mpsc::channel();
            let job = spawn_export(service.repository().clone(), &path, tx)?;
            show_progress("wrote", usize::try_from(total).unwrap_or(usize::MAX), rx);
            let written = job.join()?;
            println!("exported {written} contacts to {}", path.display());
        }
        Commands::Version => {}
    }

    Ok(())
}

/// Applies the form-level format checks before handing data to core.
fn validated_contact(
    id: ContactId,
    name: String,
    email: Option<String>,
    mobile: Option<String>,
) -> Result<Contact, CliError> {
    let contact = Contact::with_id(id, name, email, mobile);
    contact
        .validate()
        .map_err(|err| CliError::InvalidInput(err.to_string()))?;
    if let Some(email) = contact.email.as_deref() {
        if !is_valid_email(email) {
            return Err(CliError::InvalidInput(format!(
                "`{email}` is not a valid email address"
            )));
        }
    }
    if let Some(mobile) = contact.mobile.as_deref() {
        if !is_valid_mobile(mobile) {
            return Err(CliError::InvalidInput(format!(
                "`{mobile}` is not a valid mobile number (7-15 digits)"
            )));
        }
    }
    Ok(contact)
}

fn count_lines(path: &Path) -> Result<usize, RepoError> {
    let file = File::open(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            RepoError::NotFound(path.to_path_buf())
        } else {
            RepoError::Io(err)
        }
    })?;
    let mut count = 0;
    for line in BufReader::new(file).split(b'\n') {
        line?;
        count += 1;
    }
    Ok(count)
}

/// Drains progress ticks to stderr; a failed write is logged and rendering stops.
fn show_progress(verb: &str, total: usize, ticks: mpsc::Receiver<usize>) {
    if let Err(err) = render_progress(&mut std::io::stderr(), verb, total, ticks) {
        warn!(
            "event=cli_progress module=cli status=error error_code=stderr_write_failed error={}",
            err
        );
    }
}

fn render_progress(
    out: &mut impl Write,
    verb: &str,
    total: usize,
    ticks: mpsc::Receiver<usize>,
) -> std::io::Result<()> {
    let tracker = ProgressTracker::new(total);
    let mut rendered = false;
    for processed in ticks {
        write!(out, "\r{}", format_progress(verb, &tracker.record(processed)))?;
        rendered = true;
    }
    if rendered {
        writeln!(out)?;
    }
    Ok(())
}

fn format_progress(verb: &str, snapshot: &ProgressSnapshot) -> String {
    let eta = snapshot.eta.as_secs();
    format!(
        "{verb} {}/{} ({}%) - ETA {:02}:{:02}",
        snapshot.processed,
        snapshot.total,
        snapshot.percent,
        eta / 60,
        eta % 60
    )
}

#[cfg(test)]
mod tests {
    use super::{format_progress, render_progress, validated_contact, Cli, CliError, Commands};
    use clap::{CommandFactory, Parser};
    use contacts_core::ProgressSnapshot;
    use std::io::{self, Write};
    use std::path::PathBuf;
    use std::sync::mpsc;
    use std::time::Duration;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn ticks(values: &[usize]) -> mpsc::Receiver<usize> {
        let (tx, rx) = mpsc::channel();
        for value in values {
            tx.send(*value).unwrap();
        }
        rx
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn db_flag_and_delete_id_are_parsed() {
        let cli = Cli::try_parse_from(["contacts", "--db", "/tmp/a.db", "delete", "3"]).unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/a.db"));
        assert_eq!(cli.command, Commands::Delete { id: 3 });
    }

    #[test]
    fn list_options_are_parsed() {
        let cli = Cli::try_parse_from([
            "contacts", "list", "--page", "2", "--search", "alice", "--size", "5",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::List {
                page: 2,
                size: 5,
                search: Some("alice".to_string()),
            }
        );
    }

    #[test]
    fn optional_contact_fields_are_positional() {
        let cli = Cli::try_parse_from(["contacts", "add", "Bob", "bob@example.com"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Add {
                name: "Bob".to_string(),
                email: Some("bob@example.com".to_string()),
                mobile: None,
            }
        );
    }

    #[test]
    fn bad_arguments_are_rejected() {
        for bad in [
            &["contacts", "list", "--page", "0"][..],
            &["contacts", "delete"][..],
            &["contacts", "delete", "0"][..],
            &["contacts", "update", "x", "Bob"][..],
            &["contacts", "frobnicate"][..],
        ] {
            assert!(Cli::try_parse_from(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn form_validation_rejects_malformed_email_and_mobile() {
        assert!(validated_contact(0, "Bob".into(), Some("bob@example.com".into()), None).is_ok());
        assert!(matches!(
            validated_contact(0, "Bob".into(), Some("bob".into()), None),
            Err(CliError::InvalidInput(_))
        ));
        assert!(matches!(
            validated_contact(0, "Bob".into(), None, Some("12ab".into())),
            Err(CliError::InvalidInput(_))
        ));
        assert!(matches!(
            validated_contact(0, " ".into(), None, None),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn progress_line_shows_counts_percent_and_eta() {
        let snapshot = ProgressSnapshot {
            processed: 50,
            total: 200,
            percent: 25,
            eta: Duration::from_secs(95),
        };
        assert_eq!(
            format_progress("processed", &snapshot),
            "processed 50/200 (25%) - ETA 01:35"
        );
    }

    #[test]
    fn render_progress_ends_with_a_newline_after_ticks() {
        let mut out = Vec::new();
        render_progress(&mut out, "wrote", 2, ticks(&[1, 2])).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\rwrote 1/2 (50%)"));
        assert!(text.contains("\rwrote 2/2 (100%) - ETA 00:00"));
        assert!(text.ends_with('\n'));

        let mut silent = Vec::new();
        render_progress(&mut silent, "wrote", 0, ticks(&[])).unwrap();
        assert!(silent.is_empty());
    }

    #[test]
    fn render_progress_reports_write_failures() {
        let err = render_progress(&mut BrokenPipe, "processed", 3, ticks(&[1])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
