//! Off-thread execution for CSV import/export.
//!
//! # Responsibility
//! - Run bulk transfers on a dedicated worker thread so the caller's thread
//!   keeps dispatching UI events.
//! - Hand back a join/cancel handle.
//!
//! # Invariants
//! - Progress is delivered through the caller's sink from the worker thread;
//!   use an `mpsc::Sender<usize>` sink to marshal ticks back to the UI thread.
//! - `join` never panics; a panicked worker surfaces as `RepoError::WorkerPanicked`.

use super::progress::{CancellationToken, ProgressSink};
use crate::repo::contact_repo::{RepoError, RepoResult, SqliteContactRepository};
use log::{error, info};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Handle to a running background import or export.
#[derive(Debug)]
pub struct BulkJob<T> {
    cancel: CancellationToken,
    handle: JoinHandle<RepoResult<T>>,
}

impl<T> BulkJob<T> {
    /// Requests cooperative cancellation at the next record boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the worker finishes and returns its result.
    pub fn join(self) -> RepoResult<T> {
        self.handle.join().map_err(|_| {
            error!("event=bulk_job module=transfer status=error error_code=worker_panicked");
            RepoError::WorkerPanicked
        })?
    }
}

/// Starts `import_from_csv_with_progress` on a worker thread.
///
/// The job result is the inserted row count.
pub fn spawn_import<S>(
    repo: SqliteContactRepository,
    path: impl Into<PathBuf>,
    sink: S,
) -> RepoResult<BulkJob<usize>>
where
    S: ProgressSink + Send + 'static,
{
    let path = path.into();
    spawn_job("contacts-import", sink, move |cancel, sink| {
        repo.import_from_csv_with_progress(&path, sink, cancel)
    })
}

/// Starts `export_to_csv_with_progress` on a worker thread.
///
/// The job result is the written row count.
pub fn spawn_export<S>(
    repo: SqliteContactRepository,
    path: impl Into<PathBuf>,
    sink: S,
) -> RepoResult<BulkJob<usize>>
where
    S: ProgressSink + Send + 'static,
{
    let path = path.into();
    spawn_job("contacts-export", sink, move |cancel, sink| {
        repo.export_to_csv_with_progress(&path, sink, cancel)
    })
}

fn spawn_job<T, S, F>(name: &str, mut sink: S, work: F) -> RepoResult<BulkJob<T>>
where
    T: Send + 'static,
    S: ProgressSink + Send + 'static,
    F: FnOnce(&CancellationToken, &mut dyn ProgressSink) -> RepoResult<T> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let worker_cancel = cancel.clone();
    let job_name = name.to_string();

    let handle = thread::Builder::new()
        .name(job_name.clone())
        .spawn(move || {
            let result = work(&worker_cancel, &mut sink);
            match &result {
                Ok(_) => info!("event=bulk_job module=transfer status=ok job={job_name}"),
                Err(err) if err.is_cancelled() => {
                    info!("event=bulk_job module=transfer status=cancelled job={job_name}")
                }
                Err(err) => {
                    error!("event=bulk_job module=transfer status=error job={job_name} error={err}")
                }
            }
            result
        })?;

    info!("event=bulk_job module=transfer status=start job={name}");
    Ok(BulkJob { cancel, handle })
}
