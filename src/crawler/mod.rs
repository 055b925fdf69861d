//! Crawl orchestration
//!
//! This module ties the pieces of a crawl pass together:
//! - Batch-and-join execution of extraction tasks
//! - The coordinator walking one listing page
//! - Process-level setup: renderer, storage, adapter and run bookkeeping

mod batch;
mod coordinator;

pub use batch::TaskGroup;
pub use coordinator::{Coordinator, CrawlReport, MatchFailure};

use crate::adapters::{build_adapter, AdapterContext};
use crate::config::Config;
use crate::render::HttpRenderer;
use crate::storage::{open_storage, RunStatus};
use crate::CrawlError;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl pass
///
/// This is the main entry point for a crawl. It will:
/// 1. Open the database
/// 2. Build the HTTP renderer and the configured site adapter
/// 3. Record a new crawl run
/// 4. Extract every match on the listing page in batches
/// 5. Mark the run completed, or failed if the listing could not be read
///
/// # Arguments
///
/// * `config` - The validated crawler configuration
/// * `config_hash` - Hash of the configuration file, stored with the run
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The pass finished; some matches may have failed
/// * `Err(CrawlError)` - Setup failed or the listing page was unreadable
pub async fn crawl(config: &Config, config_hash: &str) -> Result<CrawlReport, CrawlError> {
    let site = config.crawler.site;
    let listing_url = config.crawler.listing_url()?;

    let storage = Arc::new(open_storage(Path::new(&config.database.path))?);
    let ctx = AdapterContext {
        renderer: Arc::new(HttpRenderer::new(&config.renderer)?),
        repository: storage.clone(),
        base_url: config.crawler.base_url()?,
        render_timeout: config.crawler.render_timeout(),
    };
    let adapter = build_adapter(site, ctx);

    let run_id = storage.create_run(site.as_str(), &listing_url, config_hash)?;
    tracing::info!(run_id, site = %site, url = %listing_url, "Crawl run started");

    let result = Coordinator::new(config.crawler.batch_size)
        .run(adapter, &listing_url)
        .await;

    match &result {
        Ok(report) => storage.finish_run(
            run_id,
            RunStatus::Completed,
            report.stored as u64,
            report.failures.len() as u64,
        )?,
        Err(err) => {
            tracing::error!(run_id, error = %err, "Crawl run failed");
            storage.finish_run(run_id, RunStatus::Failed, 0, 0)?;
        }
    }

    result
}
