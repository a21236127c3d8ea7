//! Background pre-warming of the content cache.
//!
//! A fixed set of worker tasks drains a bounded queue of article URLs and runs
//! each through [`ScrapeService::prewarm`]. Submission never waits: when the
//! queue is full the URL is dropped. Failures end up in the log and in the
//! counters, never with the submitter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::content::{PageFetcher, PrewarmOutcome, ScrapeService};

#[derive(Debug, Default)]
struct Counters {
    scraped: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    dropped: AtomicUsize,
}

/// Snapshot of what the pool has done so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrewarmStats {
    /// Pages fetched and cached
    pub scraped: usize,
    /// URLs that already had a fresh entry
    pub skipped: usize,
    /// Scrapes that failed and left a failure record
    pub failed: usize,
    /// Submissions rejected because the queue was full
    pub dropped: usize,
}

impl PrewarmStats {
    /// Jobs that reached a worker and finished, whatever the outcome.
    pub fn finished(&self) -> usize {
        self.scraped + self.skipped + self.failed
    }
}

/// Bounded worker pool for cache pre-warming.
///
/// Workers stop once the pool (the only sender) is dropped and the queue drains.
pub struct PrewarmPool {
    tx: mpsc::Sender<String>,
    counters: Arc<Counters>,
}

impl PrewarmPool {
    /// Spawns `workers` tasks on the current tokio runtime.
    pub fn spawn<F: PageFetcher>(
        scraper: Arc<ScrapeService<F>>,
        workers: usize,
        queue: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<String>(queue.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let counters = Arc::new(Counters::default());

        for worker in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let scraper = Arc::clone(&scraper);
            let counters = Arc::clone(&counters);
            tokio::spawn(async move {
                loop {
                    // Release the receiver before scraping so other workers can pick up jobs
                    let next = rx.lock().await.recv().await;
                    let Some(url) = next else { break };
                    run_job(&scraper, &counters, worker, &url).await;
                }
                tracing::trace!(worker = worker, "Pre-warm worker stopped");
            });
        }

        Self { tx, counters }
    }

    /// Queues `url` for pre-warming. Returns false if it was dropped.
    pub fn submit(&self, url: String) -> bool {
        match self.tx.try_send(url) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(url)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(url = %url, "Pre-warm queue full, dropping job");
                false
            }
            Err(mpsc::error::TrySendError::Closed(url)) => {
                tracing::warn!(url = %url, "Pre-warm workers gone, dropping job");
                false
            }
        }
    }

    pub fn stats(&self) -> PrewarmStats {
        PrewarmStats {
            scraped: self.counters.scraped.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

async fn run_job<F: PageFetcher>(
    scraper: &ScrapeService<F>,
    counters: &Counters,
    worker: usize,
    url: &str,
) {
    match scraper.prewarm(url).await {
        Ok(PrewarmOutcome::Scraped) => {
            counters.scraped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(worker = worker, url = %url, "Pre-warmed article");
        }
        Ok(PrewarmOutcome::AlreadyCached) => {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(worker = worker, url = %url, error = %e, "Pre-warm scrape failed");
        }
    }
}
