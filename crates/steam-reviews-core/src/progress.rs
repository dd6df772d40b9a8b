use std::panic::{self, AssertUnwindSafe};
use tracing::{info, warn};

/// Receives `(collected_so_far, target_count)` after every accepted review.
///
/// Called synchronously from the collection loop, so implementations must
/// return quickly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, collected: usize, target: usize);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn report(&self, collected: usize, target: usize) {
        self(collected, target)
    }
}

/// Wraps an optional sink so a panicking sink cannot abort a fetch
pub(crate) struct GuardedSink<'a> {
    sink: Option<&'a dyn ProgressSink>,
    failed: bool,
}

impl<'a> GuardedSink<'a> {
    pub(crate) fn new(sink: Option<&'a dyn ProgressSink>) -> Self {
        Self { sink, failed: false }
    }

    pub(crate) fn notify(&mut self, collected: usize, target: usize) {
        let Some(sink) = self.sink else {
            return;
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| sink.report(collected, target)));
        if result.is_err() && !self.failed {
            // Only the first failure is logged; later calls still go through
            warn!("Progress sink panicked at {}/{}; continuing without interruption", collected, target);
            self.failed = true;
        }
    }
}

/// Periodic progress logging for a fetch, plus a final summary
pub struct ProgressTracker {
    target: usize,
    pages: usize,
    start_time: std::time::Instant,
    progress_interval: usize, // Log every N entries
    last_progress_log: usize,
}

impl ProgressTracker {
    /// # Arguments
    /// * `target` - Number of entries the fetch is aiming for
    /// * `progress_interval` - Log progress every N entries
    pub fn new(target: usize, progress_interval: usize) -> Self {
        if target > progress_interval {
            info!("Starting review fetch: {} reviews requested", target);
        }
        Self {
            target,
            pages: 0,
            start_time: std::time::Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
        }
    }

    pub fn record_page(&mut self) {
        self.pages += 1;
    }

    /// Log progress if the interval has been reached
    ///
    /// # Arguments
    /// * `current` - Entries collected so far
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log >= self.progress_interval || current == self.target {
            let elapsed = self.start_time.elapsed();

            // Fast fetches (mocked or tiny) are not worth a progress line
            if elapsed.as_secs_f64() < 0.5 && current < self.target {
                return;
            }

            let rate = if elapsed.as_secs_f64() > 0.0 {
                current as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            };

            info!(
                "Progress: {}/{} ({:.1} reviews/sec) | Pages: {}",
                current, self.target, rate, self.pages
            );
            self.last_progress_log = current;
        }
    }

    /// Log the final summary
    ///
    /// # Arguments
    /// * `collected` - Entries returned to the caller
    /// * `exit` - Why the page loop stopped
    pub fn log_summary(&self, collected: usize, exit: &str) {
        let elapsed = self.start_time.elapsed();
        if collected < self.target {
            warn!(
                "Review fetch stopped early ({}): {}/{} reviews from {} page(s) in {:.1}s",
                exit,
                collected,
                self.target,
                self.pages,
                elapsed.as_secs_f64()
            );
        } else {
            info!(
                "Review fetch completed: {} reviews from {} page(s) in {:.1}s",
                collected,
                self.pages,
                elapsed.as_secs_f64()
            );
        }
    }
}
