use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use steam_reviews_models::{ReviewEntry, ReviewFilters, ReviewPage, FIRST_PAGE_CURSOR};
use steam_reviews_sources::{ReviewSource, SourceError};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::CollectError;
use crate::progress::{GuardedSink, ProgressSink, ProgressTracker};
use crate::resolver::IdentityResolver;

/// Log a progress line every N collected reviews
const PROGRESS_LOG_INTERVAL: usize = 100;

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Reviews requested per page
    pub page_size: u32,

    /// Courtesy pause between page requests
    pub page_delay: Duration,

    /// Upper bound for a single HTTP request; sources that issue several
    /// requests per page widen it through `ReviewSource::call_timeout`
    pub request_timeout: Duration,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            page_size: 100,
            page_delay: Duration::from_millis(250),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Result of one page request
#[derive(Debug)]
enum PageOutcome {
    Records(ReviewPage),
    Exhausted,
    Failed(SourceError),
}

/// Why the page loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CollectExit {
    TargetReached,
    Exhausted,
    PageFailed,
}

impl CollectExit {
    fn as_str(&self) -> &'static str {
        match self {
            CollectExit::TargetReached => "target reached",
            CollectExit::Exhausted => "source exhausted",
            CollectExit::PageFailed => "page request failed",
        }
    }
}

/// Drives cursor pagination against a [`ReviewSource`] and labels the
/// collected reviews through an [`IdentityResolver`].
///
/// One collector serves one fetch at a time; it holds no state between calls.
pub struct ReviewCollector {
    source: Arc<dyn ReviewSource>,
    resolver: IdentityResolver,
    options: CollectorOptions,
}

impl ReviewCollector {
    pub fn new(source: Arc<dyn ReviewSource>, resolver: IdentityResolver, options: CollectorOptions) -> Self {
        Self {
            source,
            resolver,
            options,
        }
    }

    /// Fetch up to `target_count` reviews for `source_id`, most recent first.
    ///
    /// Returns whatever was gathered when the source runs dry or a later page
    /// fails. Fails with [`CollectError::SourceUnavailable`] only when the
    /// first page request fails.
    pub async fn fetch(
        &self,
        source_id: &str,
        target_count: usize,
        filters: &ReviewFilters,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<ReviewEntry>, CollectError> {
        if target_count == 0 {
            return Ok(Vec::new());
        }

        let mut sink = GuardedSink::new(progress);
        let mut tracker = ProgressTracker::new(target_count, PROGRESS_LOG_INTERVAL);
        let mut entries: Vec<ReviewEntry> = Vec::with_capacity(target_count.min(1000));
        let mut cursor = FIRST_PAGE_CURSOR.to_string();
        let mut requests = 0usize;

        let exit = loop {
            if requests > 0 {
                sleep(self.options.page_delay).await;
            }
            requests += 1;

            let page = match self.request_page(source_id, filters, &cursor).await {
                PageOutcome::Records(page) => page,
                PageOutcome::Exhausted => break CollectExit::Exhausted,
                PageOutcome::Failed(e) if requests == 1 => {
                    warn!(
                        "First page request to {} for app {} failed: {}",
                        self.source.source_name(),
                        source_id,
                        e
                    );
                    return Err(CollectError::SourceUnavailable {
                        source_id: source_id.to_string(),
                        source: e,
                    });
                }
                PageOutcome::Failed(e) => {
                    warn!(
                        "Page {} from {} failed after {} reviews: {}. Returning partial result",
                        requests,
                        self.source.source_name(),
                        entries.len(),
                        e
                    );
                    break CollectExit::PageFailed;
                }
            };
            tracker.record_page();

            for raw in page.reviews {
                entries.push(ReviewEntry::from_raw(raw));
                sink.notify(entries.len(), target_count);
                tracker.log_progress(entries.len());

                if entries.len() >= target_count {
                    break;
                }
            }

            if entries.len() >= target_count {
                break CollectExit::TargetReached;
            }

            match page.next_cursor {
                Some(next) => cursor = next,
                None => break CollectExit::Exhausted,
            }
        };

        tracker.log_summary(entries.len(), exit.as_str());

        let author_ids = distinct_author_ids(&entries);
        let labels = self.resolver.resolve(author_ids).await;
        for entry in entries.iter_mut() {
            entry.apply_label(labels.get(&entry.author_id));
        }

        Ok(entries)
    }

    async fn request_page(&self, source_id: &str, filters: &ReviewFilters, cursor: &str) -> PageOutcome {
        let request = self
            .source
            .fetch_page(source_id, filters, self.options.page_size, cursor);

        let limit = self.source.call_timeout(self.options.request_timeout);
        let result = match timeout(limit, request).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout(limit)),
        };

        match result {
            Ok(page) if page.is_empty() => {
                debug!("Empty page at cursor {}; source exhausted", cursor);
                PageOutcome::Exhausted
            }
            Ok(page) => PageOutcome::Records(page),
            Err(e) => PageOutcome::Failed(e),
        }
    }
}

/// Distinct non-empty author ids in first-seen order
fn distinct_author_ids(entries: &[ReviewEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|e| !e.author_id.is_empty() && seen.insert(e.author_id.as_str()))
        .map(|e| e.author_id.clone())
        .collect()
}
