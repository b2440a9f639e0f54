//! Progress reporting and cooperative cancellation for bulk operations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Receives the 1-based count of records processed so far.
///
/// Called synchronously once per record with strictly increasing values.
pub trait ProgressSink {
    fn report(&mut self, processed: usize);
}

impl<F: FnMut(usize)> ProgressSink for F {
    fn report(&mut self, processed: usize) {
        self(processed)
    }
}

/// Forwards ticks to another thread. A dropped receiver is ignored so a
/// closed UI never aborts a running import.
impl ProgressSink for Sender<usize> {
    fn report(&mut self, processed: usize) {
        let _ = self.send(processed);
    }
}

/// Sink that discards every tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _processed: usize) {}
}

/// Shared cancellation flag checked once per record boundary.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Point-in-time progress with an estimated time remaining.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub processed: usize,
    pub total: usize,
    pub percent: u8,
    pub eta: Duration,
}

/// Turns progress ticks into percent/ETA for display.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: usize,
    started_at: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            started_at: Instant::now(),
        }
    }

    pub fn record(&self, processed: usize) -> ProgressSnapshot {
        estimate(processed, self.total, self.started_at.elapsed())
    }
}

/// Computes percent done and `eta = remaining / rate`.
///
/// Elapsed time below one second counts as one second, so early ticks do not
/// produce an inflated rate.
pub fn estimate(processed: usize, total: usize, elapsed: Duration) -> ProgressSnapshot {
    let percent = if total == 0 {
        100
    } else {
        (processed.min(total) * 100 / total) as u8
    };

    let seconds = elapsed.as_secs_f64().max(1.0);
    let rate = processed as f64 / seconds;
    let remaining = total.saturating_sub(processed) as f64;
    let eta = if rate > 0.0 {
        Duration::from_secs_f64(remaining / rate)
    } else {
        Duration::ZERO
    };

    ProgressSnapshot {
        processed,
        total,
        percent,
        eta,
    }
}

#[cfg(test)]
mod tests {
    use super::{estimate, CancellationToken, ProgressSink};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn cancellation_is_visible_through_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }

    #[test]
    fn closures_and_senders_are_sinks() {
        let mut seen = Vec::new();
        {
            let mut sink = |processed: usize| seen.push(processed);
            sink.report(1);
            sink.report(2);
        }
        assert_eq!(seen, vec![1, 2]);

        let (mut tx, rx) = mpsc::channel::<usize>();
        tx.report(7);
        assert_eq!(rx.recv().unwrap(), 7);
        drop(rx);
        tx.report(8);
    }

    #[test]
    fn estimate_derives_eta_from_rate() {
        let snapshot = estimate(25, 100, Duration::from_secs(5));
        assert_eq!(snapshot.percent, 25);
        assert_eq!(snapshot.eta, Duration::from_secs(15));
    }

    #[test]
    fn estimate_treats_sub_second_elapsed_as_one_second() {
        let snapshot = estimate(10, 30, Duration::from_millis(10));
        assert_eq!(snapshot.eta, Duration::from_secs(2));
    }

    #[test]
    fn estimate_handles_empty_and_unstarted_runs() {
        assert_eq!(estimate(0, 0, Duration::ZERO).percent, 100);
        assert_eq!(estimate(0, 10, Duration::from_secs(3)).eta, Duration::ZERO);
    }
}
