// Broken link detection across a set of scraped pages

use crate::error::{AuditError, Result};
use crate::model::{BatchState, BrokenLinkRecord, ScrapedPage};
use crate::snapshot::SnapshotStore;
use futures::stream::{self, StreamExt};
use linkrot_scanner::{
    AccessibilityProbe, CachedVerdict, ExtractedLink, ProbeCache, ScopePredicate, allow_all,
    extract_internal_links,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Callback for reporting page progress: (position, total, page url)
pub type AuditProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Tunables for an audit run
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Number of link probes issued together
    pub probe_group_size: usize,
    /// Pause between two probe groups
    pub probe_group_delay: Duration,
    /// Snapshots fetched ahead of the page being processed
    pub snapshot_concurrency: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            probe_group_size: 5,
            probe_group_delay: Duration::from_millis(100),
            snapshot_concurrency: 4,
        }
    }
}

/// Everything an audit needs from its surroundings
pub struct AuditContext {
    pub site_id: String,
    pub bucket: String,
    pub store: Arc<dyn SnapshotStore>,
    pub prober: Arc<dyn AccessibilityProbe>,
    pub scope: ScopePredicate,
    pub config: AuditConfig,
    pub progress: Option<AuditProgressCallback>,
}

impl AuditContext {
    pub fn new(
        site_id: impl Into<String>,
        bucket: impl Into<String>,
        store: Arc<dyn SnapshotStore>,
        prober: Arc<dyn AccessibilityProbe>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            bucket: bucket.into(),
            store,
            prober,
            scope: allow_all(),
            config: AuditConfig::default(),
            progress: None,
        }
    }

    pub fn with_scope(mut self, scope: ScopePredicate) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_config(mut self, config: AuditConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_progress_callback(mut self, callback: AuditProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }
}

/// Options for one resumable batch
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Page URL to snapshot key
    pub page_mapping: HashMap<String, String>,
    pub batch_start_index: usize,
    pub batch_size: usize,
    pub initial_broken_urls: Vec<String>,
    pub initial_working_urls: Vec<String>,
}

impl BatchOptions {
    /// Options for the batch following a previous one
    pub fn resume(page_mapping: HashMap<String, String>, state: BatchState, batch_size: usize) -> Self {
        Self {
            page_mapping,
            batch_start_index: state.batch_start_index,
            batch_size,
            initial_broken_urls: state.broken_urls_cache,
            initial_working_urls: state.working_urls_cache,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_links_analyzed: usize,
    pub links_probed: usize,
    pub cache_hits_broken: usize,
    pub cache_hits_working: usize,
    /// Percentage of analyzed links answered from the cache
    pub cache_hit_rate: f64,
    pub processing_time_ms: u64,
}

impl BatchStats {
    pub fn cache_hits(&self) -> usize {
        self.cache_hits_broken + self.cache_hits_working
    }

    fn finish(&mut self, started: Instant) {
        self.cache_hit_rate = if self.total_links_analyzed == 0 {
            0.0
        } else {
            let rate = self.cache_hits() as f64 / self.total_links_analyzed as f64 * 100.0;
            (rate * 10.0).round() / 10.0
        };
        self.processing_time_ms = started.elapsed().as_millis() as u64;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub results: Vec<BrokenLinkRecord>,
    pub broken_urls_cache: Vec<String>,
    pub working_urls_cache: Vec<String>,
    pub pages_processed: usize,
    pub pages_skipped: usize,
    pub has_more_pages: bool,
    pub next_batch_start_index: usize,
    pub stats: BatchStats,
}

impl BatchResult {
    /// State to hand to the next batch call
    pub fn next_state(&self) -> BatchState {
        BatchState {
            batch_start_index: self.next_batch_start_index,
            broken_urls_cache: self.broken_urls_cache.clone(),
            working_urls_cache: self.working_urls_cache.clone(),
        }
    }
}

/// Run the whole page set in one call and return every broken link found.
///
/// Pages are visited in URL order starting from an empty probe cache, so the
/// result matches what a sequence of batch calls over the same mapping yields.
pub async fn detect_broken_links_from_crawl(
    page_mapping: &HashMap<String, String>,
    ctx: &AuditContext,
) -> Vec<BrokenLinkRecord> {
    let started = Instant::now();
    let pages = sorted_pages(page_mapping);
    info!(site_id = %ctx.site_id, pages = pages.len(), "Starting broken link detection");

    let mut run = PageRun::new(ctx, ProbeCache::new());
    run.process(&pages, 0, pages.len()).await;
    run.stats.finish(started);

    info!(
        site_id = %ctx.site_id,
        broken_links = run.results.len(),
        pages_skipped = run.pages_skipped,
        links_analyzed = run.stats.total_links_analyzed,
        links_probed = run.stats.links_probed,
        cache_hit_rate = run.stats.cache_hit_rate,
        "Broken link detection complete"
    );
    run.results
}

/// Process one slice of the page set, carrying the probe cache in and out.
pub async fn detect_broken_links_from_crawl_batch(
    options: BatchOptions,
    ctx: &AuditContext,
) -> Result<BatchResult> {
    let BatchOptions {
        page_mapping,
        batch_start_index,
        batch_size,
        initial_broken_urls,
        initial_working_urls,
    } = options;

    if batch_size == 0 {
        return Err(AuditError::InvalidOptions(
            "batch size must be at least 1".to_string(),
        ));
    }

    let started = Instant::now();
    let pages = sorted_pages(&page_mapping);
    let total_pages = pages.len();
    let batch_end = batch_start_index.saturating_add(batch_size);
    let slice = &pages[batch_start_index.min(total_pages)..batch_end.min(total_pages)];

    info!(
        site_id = %ctx.site_id,
        batch_start_index,
        batch_size,
        total_pages,
        cached_broken = initial_broken_urls.len(),
        cached_working = initial_working_urls.len(),
        "Starting broken link batch"
    );

    let cache = ProbeCache::from_parts(initial_broken_urls, initial_working_urls);
    let mut run = PageRun::new(ctx, cache);
    run.process(slice, batch_start_index, total_pages).await;
    run.stats.finish(started);

    let PageRun {
        cache,
        results,
        pages_skipped,
        stats,
        ..
    } = run;
    let (broken_urls_cache, working_urls_cache) = cache.into_parts();
    let has_more_pages = batch_end < total_pages;

    info!(
        site_id = %ctx.site_id,
        pages_processed = slice.len(),
        pages_skipped,
        broken_links = results.len(),
        links_probed = stats.links_probed,
        cache_hit_rate = stats.cache_hit_rate,
        has_more_pages,
        "Broken link batch complete"
    );

    Ok(BatchResult {
        results,
        broken_urls_cache,
        working_urls_cache,
        pages_processed: slice.len(),
        pages_skipped,
        has_more_pages,
        next_batch_start_index: batch_end,
        stats,
    })
}

fn sorted_pages(page_mapping: &HashMap<String, String>) -> Vec<(&str, &str)> {
    let mut pages: Vec<(&str, &str)> = page_mapping
        .iter()
        .map(|(url, key)| (url.as_str(), key.as_str()))
        .collect();
    pages.sort_unstable();
    pages
}

enum PageLoad {
    OutOfScope,
    Missing,
    Loaded(ScrapedPage),
}

async fn load_page(ctx: &AuditContext, url: &str, key: &str) -> PageLoad {
    if !(ctx.scope)(url) {
        return PageLoad::OutOfScope;
    }

    match ctx.store.get_object(&ctx.bucket, key).await {
        Ok(Some(snapshot)) => match snapshot.into_scraped_page(url) {
            Some(page) => PageLoad::Loaded(page),
            None => {
                error!(site_id = %ctx.site_id, url, key, "Snapshot has no raw body, skipping page");
                PageLoad::Missing
            }
        },
        Ok(None) => {
            error!(site_id = %ctx.site_id, url, key, "Snapshot not found, skipping page");
            PageLoad::Missing
        }
        Err(e) => {
            error!(site_id = %ctx.site_id, url, key, error = %e, "Failed to fetch snapshot, skipping page");
            PageLoad::Missing
        }
    }
}

/// Accumulator shared by the full-run and batch entry points
struct PageRun<'a> {
    ctx: &'a AuditContext,
    cache: ProbeCache,
    emitted: HashSet<(String, String)>,
    results: Vec<BrokenLinkRecord>,
    pages_skipped: usize,
    stats: BatchStats,
}

impl<'a> PageRun<'a> {
    fn new(ctx: &'a AuditContext, cache: ProbeCache) -> Self {
        Self {
            ctx,
            cache,
            emitted: HashSet::new(),
            results: Vec::new(),
            pages_skipped: 0,
            stats: BatchStats::default(),
        }
    }

    async fn process(&mut self, pages: &[(&str, &str)], offset: usize, total: usize) {
        let ctx = self.ctx;
        let loads = stream::iter(pages.iter().copied())
            .map(|(url, key)| async move { (url, load_page(ctx, url, key).await) })
            .buffered(ctx.config.snapshot_concurrency.max(1));
        let mut loads = pin!(loads);

        let mut position = offset;
        while let Some((url, load)) = loads.next().await {
            position += 1;
            if let Some(ref callback) = ctx.progress {
                callback(position, total, url);
            }

            match load {
                PageLoad::OutOfScope => {
                    debug!(site_id = %ctx.site_id, url, "Page outside audit scope");
                }
                PageLoad::Missing => self.pages_skipped += 1,
                PageLoad::Loaded(page) => self.process_page(&page).await,
            }
        }
    }

    async fn process_page(&mut self, page: &ScrapedPage) {
        let ctx = self.ctx;
        let candidates: Vec<ExtractedLink> = extract_internal_links(&page.raw_html, page.base_url())
            .into_iter()
            .filter(|link| (ctx.scope)(&link.resolved_url))
            .collect();

        debug!(site_id = %ctx.site_id, url = %page.url, links = candidates.len(), "Checking page links");

        let mut probed_previous_group = false;
        for group in candidates.chunks(ctx.config.probe_group_size.max(1)) {
            let mut misses = Vec::new();
            for link in group {
                self.stats.total_links_analyzed += 1;
                match self.cache.lookup(&link.resolved_url) {
                    Some(CachedVerdict::Broken) => {
                        self.stats.cache_hits_broken += 1;
                        self.emit(&page.url, link);
                    }
                    Some(CachedVerdict::Working) => self.stats.cache_hits_working += 1,
                    None => misses.push(link),
                }
            }

            if misses.is_empty() {
                probed_previous_group = false;
                continue;
            }
            // Pause only between two groups that both hit the network
            if probed_previous_group && !ctx.config.probe_group_delay.is_zero() {
                tokio::time::sleep(ctx.config.probe_group_delay).await;
            }
            probed_previous_group = true;

            let verdicts = futures::future::join_all(
                misses
                    .iter()
                    .map(|link| ctx.prober.is_link_inaccessible(&link.resolved_url, &ctx.site_id)),
            )
            .await;

            for (link, inaccessible) in misses.into_iter().zip(verdicts) {
                self.stats.links_probed += 1;
                self.cache.record(&link.resolved_url, inaccessible);
                if inaccessible {
                    self.emit(&page.url, link);
                }
            }
        }
    }

    fn emit(&mut self, url_from: &str, link: &ExtractedLink) {
        let key = (url_from.to_string(), link.resolved_url.clone());
        if self.emitted.insert(key) {
            self.results.push(BrokenLinkRecord::new(
                url_from,
                &link.resolved_url,
                &link.anchor_text,
            ));
        }
    }
}
