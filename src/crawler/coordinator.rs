//! Crawl coordinator - one pass over a listing page
//!
//! The coordinator asks the adapter for the listing's match URLs, then runs
//! one extraction task per URL in batches. A failed match is logged and
//! recorded in the report; it never stops the rest of the pass. Only a
//! listing that cannot be read aborts the run.

use crate::adapters::{LayoutMismatch, Site, SiteAdapter};
use crate::crawler::batch::TaskGroup;
use crate::state::ExtractionState;
use crate::CrawlError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A match page that could not be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchFailure {
    pub url: String,

    /// Extraction state the failure happened in; `Failed` if the task itself
    /// died before reporting one
    pub stage: ExtractionState,

    pub error: String,
}

/// Outcome of one crawl pass
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub site: Site,
    pub listing_url: String,

    /// Match URLs found on the listing page
    pub listed: usize,

    /// Matches stored with their bets
    pub stored: usize,

    pub failures: Vec<MatchFailure>,

    /// Listing entries skipped because no match link could be read
    pub mismatches: Vec<LayoutMismatch>,

    pub batches: usize,
    pub elapsed: Duration,
}

impl CrawlReport {
    /// True when every listed match was stored
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.stored == self.listed
    }
}

/// Drives a site adapter over one listing page
pub struct Coordinator {
    tasks: TaskGroup,
}

impl Coordinator {
    /// Creates a coordinator running `batch_size` extractions at a time
    pub fn new(batch_size: usize) -> Self {
        Self {
            tasks: TaskGroup::new(batch_size),
        }
    }

    /// Runs one crawl pass
    ///
    /// # Arguments
    ///
    /// * `adapter` - The site adapter; shared by all extraction tasks
    /// * `listing_url` - Page enumerating the matches to crawl
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Listing was read; per-match failures are in the report
    /// * `Err(CrawlError::Listing)` - The listing page could not be rendered or read
    pub async fn run(
        &self,
        adapter: Arc<dyn SiteAdapter>,
        listing_url: &str,
    ) -> Result<CrawlReport, CrawlError> {
        let site = adapter.site();
        let start_time = Instant::now();
        tracing::info!(site = %site, url = listing_url, "Reading listing");

        let listing = adapter
            .list_match_urls(listing_url)
            .await
            .map_err(|source| CrawlError::Listing {
                url: listing_url.to_string(),
                source,
            })?;

        for mismatch in &listing.mismatches {
            tracing::warn!(
                site = %site,
                url = listing_url,
                entry = mismatch.entry,
                detail = %mismatch.detail,
                "Layout mismatch on listing"
            );
        }

        let urls = listing.urls;
        tracing::info!(
            site = %site,
            matches = urls.len(),
            batch_size = self.tasks.batch_size(),
            batches = self.tasks.batch_count(urls.len()),
            "Extracting matches"
        );

        let results = self
            .tasks
            .run(urls.clone(), |url| {
                let adapter = Arc::clone(&adapter);
                async move { adapter.extract_match(&url).await }
            })
            .await;

        let mut stored = 0;
        let mut failures = Vec::new();
        for (url, result) in urls.iter().zip(results) {
            let failure = match result {
                Ok(Ok(extracted)) => {
                    tracing::debug!(
                        site = %site,
                        url = %url,
                        match_id = extracted.match_id,
                        bets = extracted.bets.len(),
                        "Match stored"
                    );
                    stored += 1;
                    continue;
                }
                Ok(Err(err)) => MatchFailure {
                    url: url.clone(),
                    stage: err.stage(),
                    error: err.to_string(),
                },
                Err(join_err) => MatchFailure {
                    url: url.clone(),
                    stage: ExtractionState::Failed,
                    error: format!("extraction task died: {}", join_err),
                },
            };

            tracing::error!(
                site = %site,
                url = %failure.url,
                stage = %failure.stage,
                error = %failure.error,
                "Match extraction failed"
            );
            failures.push(failure);
        }

        let report = CrawlReport {
            site,
            listing_url: listing_url.to_string(),
            listed: urls.len(),
            stored,
            failures,
            mismatches: listing.mismatches,
            batches: self.tasks.batch_count(urls.len()),
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            site = %site,
            listed = report.listed,
            stored = report.stored,
            failed = report.failures.len(),
            elapsed = ?report.elapsed,
            "Crawl pass finished"
        );
        Ok(report)
    }
}
