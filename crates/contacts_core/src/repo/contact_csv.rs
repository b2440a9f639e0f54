//! CSV import/export over the SQLite contact repository.
//!
//! # Responsibility
//! - Stream CSV lines into duplicate-checked inserts.
//! - Write all contacts as CSV in `get_all` order.
//!
//! # Invariants
//! - One connection per bulk run; each row is its own insert, so rows committed
//!   before a failure or cancellation stay committed.
//! - Progress is reported once per input line (import) or written row (export),
//!   strictly increasing from 1.
//! - Cancellation is checked before each record, never mid-record.
//! - Undecodable bytes never abort an import; they decode as U+FFFD.

use super::contact_repo::{insert_if_absent, select_all, RepoError, RepoResult, SqliteContactRepository};
use crate::transfer::csv_line::{format_contact_record, parse_contact_record};
use crate::transfer::progress::{CancellationToken, NoProgress, ProgressSink};
use log::{error, info, warn};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use std::time::Instant;

const UTF8_BOM: char = '\u{feff}';

impl SqliteContactRepository {
    /// Imports `name,email,mobile` lines and returns how many rows were inserted.
    ///
    /// Blank lines, blank names and existing `(name, email)` pairs are skipped.
    /// Invalid UTF-8 is decoded lossily and the line is still imported.
    ///
    /// # Errors
    /// - `RepoError::NotFound` when `path` does not exist.
    /// - `RepoError::Io`/`RepoError::Db` on read or storage failure; rows
    ///   inserted before the failure remain.
    pub fn import_from_csv(&self, path: impl AsRef<Path>) -> RepoResult<usize> {
        self.import_from_csv_with_progress(path, &mut NoProgress, &CancellationToken::new())
    }

    /// Cancellable import that reports the 1-based count of processed lines.
    ///
    /// # Errors
    /// - `RepoError::Cancelled` when `cancel` is raised between lines.
    /// - Everything `import_from_csv` returns.
    pub fn import_from_csv_with_progress(
        &self,
        path: impl AsRef<Path>,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RepoResult<usize> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(
            "event=csv_import module=repo status=start path={}",
            path.display()
        );

        let file = File::open(path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                RepoError::NotFound(path.to_path_buf())
            } else {
                RepoError::Io(err)
            }
        })?;
        let mut conn = self.connect()?;

        let mut reader = BufReader::new(file);
        let mut raw = Vec::new();
        let mut index = 0;
        let mut inserted = 0;
        loop {
            raw.clear();
            let read = reader
                .read_until(b'\n', &mut raw)
                .map_err(|err| log_import_failure(err.into(), index, inserted))?;
            if read == 0 {
                break;
            }

            if cancel.is_cancelled() {
                warn!(
                    "event=csv_import module=repo status=cancelled processed={} inserted={} duration_ms={}",
                    index,
                    inserted,
                    started_at.elapsed().as_millis()
                );
                return Err(RepoError::Cancelled {
                    processed: index,
                    committed: inserted,
                });
            }

            let decoded = decode_line(&raw);
            if let Cow::Owned(_) = decoded {
                warn!(
                    "event=csv_import module=repo status=lossy_line line={} error_code=invalid_utf8",
                    index + 1
                );
            }
            let line = if index == 0 {
                decoded.trim_start_matches(UTF8_BOM)
            } else {
                decoded.as_ref()
            };

            if let Some(contact) = parse_contact_record(line) {
                let outcome = insert_if_absent(&mut conn, &contact)
                    .map_err(|err| log_import_failure(err.into(), index, inserted))?;
                if outcome.is_inserted() {
                    inserted += 1;
                }
            }
            index += 1;
            progress.report(index);
        }

        info!(
            "event=csv_import module=repo status=ok inserted={} duration_ms={}",
            inserted,
            started_at.elapsed().as_millis()
        );
        Ok(inserted)
    }

    /// Writes every contact to `path`, overwriting it, and returns the row count.
    pub fn export_to_csv(&self, path: impl AsRef<Path>) -> RepoResult<usize> {
        self.export_to_csv_with_progress(path, &mut NoProgress, &CancellationToken::new())
    }

    /// Export that reports the 1-based count of written rows.
    ///
    /// Cancellation stops before the next row; rows already written are
    /// flushed and kept in the file.
    pub fn export_to_csv_with_progress(
        &self,
        path: impl AsRef<Path>,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RepoResult<usize> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!(
            "event=csv_export module=repo status=start path={}",
            path.display()
        );

        let contacts = {
            let conn = self.connect()?;
            select_all(&conn)?
        };

        let mut writer = BufWriter::new(File::create(path)?);
        for (index, contact) in contacts.iter().enumerate() {
            if cancel.is_cancelled() {
                writer.flush()?;
                warn!(
                    "event=csv_export module=repo status=cancelled written={} total={}",
                    index,
                    contacts.len()
                );
                return Err(RepoError::Cancelled {
                    processed: index,
                    committed: index,
                });
            }

            writeln!(writer, "{}", format_contact_record(contact))?;
            progress.report(index + 1);
        }
        writer.flush()?;

        info!(
            "event=csv_export module=repo status=ok written={} duration_ms={}",
            contacts.len(),
            started_at.elapsed().as_millis()
        );
        Ok(contacts.len())
    }
}

/// Strips the line terminator and decodes, replacing invalid UTF-8 with U+FFFD.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw)
}

fn log_import_failure(err: RepoError, index: usize, inserted: usize) -> RepoError {
    error!(
        "event=csv_import module=repo status=error line={} inserted={} error={}",
        index + 1,
        inserted,
        err
    );
    err
}
