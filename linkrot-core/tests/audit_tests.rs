// Tests for broken link detection across pages

use async_trait::async_trait;
use linkrot_core::audit::{
    AuditConfig, AuditContext, BatchOptions, detect_broken_links_from_crawl,
    detect_broken_links_from_crawl_batch,
};
use linkrot_core::error::{AuditError, Result};
use linkrot_core::model::BatchState;
use linkrot_core::snapshot::{ScrapeResult, SnapshotStore, StoredSnapshot};
use linkrot_scanner::{AccessibilityProbe, LinkCheckOutcome, ProbeErrorKind, ProbeMethod, path_prefix_scope};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const BUCKET: &str = "scrapes";

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
struct MemoryStore {
    objects: HashMap<String, StoredSnapshot>,
    failing: HashSet<String>,
}

impl MemoryStore {
    fn with_page(mut self, key: &str, html: &str) -> Self {
        self.objects.insert(
            key.to_string(),
            StoredSnapshot {
                final_url: None,
                scrape_result: Some(ScrapeResult {
                    raw_body: Some(html.to_string()),
                }),
            },
        );
        self
    }

    fn with_redirected_page(mut self, key: &str, final_url: &str, html: &str) -> Self {
        self.objects.insert(
            key.to_string(),
            StoredSnapshot {
                final_url: Some(final_url.to_string()),
                scrape_result: Some(ScrapeResult {
                    raw_body: Some(html.to_string()),
                }),
            },
        );
        self
    }

    fn with_empty_body(mut self, key: &str) -> Self {
        self.objects.insert(
            key.to_string(),
            StoredSnapshot {
                final_url: None,
                scrape_result: Some(ScrapeResult { raw_body: None }),
            },
        );
        self
    }

    fn with_failure(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<StoredSnapshot>> {
        assert_eq!(bucket, BUCKET);
        if self.failing.contains(key) {
            return Err(AuditError::Snapshot(format!("access denied: {}", key)));
        }
        Ok(self.objects.get(key).cloned())
    }
}

/// Probe that reports URLs ending in one of `broken_suffixes` as inaccessible
/// and records every URL it was asked about, plus the peak number of checks
/// running at once.
struct FakeProbe {
    broken_suffixes: Vec<&'static str>,
    latency: Duration,
    probed: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeProbe {
    fn new(broken_suffixes: &[&'static str]) -> Arc<Self> {
        Self::with_latency(broken_suffixes, Duration::ZERO)
    }

    fn with_latency(broken_suffixes: &[&'static str], latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            broken_suffixes: broken_suffixes.to_vec(),
            latency,
            probed: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        })
    }

    fn probed(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }

    fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessibilityProbe for FakeProbe {
    async fn probe(&self, url: &str, _site_id: &str) -> LinkCheckOutcome {
        self.probed.lock().unwrap().push(url.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.broken_suffixes.iter().any(|s| url.ends_with(s)) {
            LinkCheckOutcome::inaccessible(url, ProbeMethod::Head, Some(404), ProbeErrorKind::NotFound)
        } else {
            LinkCheckOutcome::accessible(url, ProbeMethod::Head, Some(200))
        }
    }
}

fn fast_config() -> AuditConfig {
    AuditConfig {
        probe_group_delay: Duration::ZERO,
        ..AuditConfig::default()
    }
}

fn context(store: MemoryStore, probe: Arc<FakeProbe>) -> AuditContext {
    AuditContext::new("site-1", BUCKET, Arc::new(store), probe).with_config(fast_config())
}

fn mapping(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(url, key)| (url.to_string(), key.to_string()))
        .collect()
}

// ============================================================================
// Full run
// ============================================================================

#[tokio::test]
async fn test_repeated_broken_link_reported_once() {
    let store = MemoryStore::default().with_page(
        "a.json",
        r#"<main><a href="/broken">Link</a><a href="/broken">Link</a><a href="/broken">Link</a></main>"#,
    );
    let probe = FakeProbe::new(&["/broken"]);
    let ctx = context(store, probe.clone());

    let results =
        detect_broken_links_from_crawl(&mapping(&[("https://example.com/a", "a.json")]), &ctx).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url_from, "https://example.com/a");
    assert_eq!(results[0].url_to, "https://example.com/broken");
    assert_eq!(results[0].anchor_text, "Link");
    assert_eq!(results[0].traffic_domain, 0.0);
    assert_eq!(probe.probed().len(), 1);
}

#[tokio::test]
async fn test_header_footer_and_fragment_links_never_probed() {
    let store = MemoryStore::default().with_page(
        "a.json",
        r##"
        <header><a href="/nav-broken">Nav</a></header>
        <main><a href="#section">Jump</a><a href="/content">Content</a></main>
        <footer><a href="/footer-broken">Footer</a></footer>
        "##,
    );
    let probe = FakeProbe::new(&["broken"]);
    let ctx = context(store, probe.clone());

    let results =
        detect_broken_links_from_crawl(&mapping(&[("https://example.com/a", "a.json")]), &ctx).await;

    assert!(results.is_empty());
    assert_eq!(probe.probed(), vec!["https://example.com/content"]);
}

#[tokio::test]
async fn test_same_url_across_pages_probed_once() {
    let html = r#"<a href="/gone">Gone</a><a href="/fine">Fine</a>"#;
    let store = MemoryStore::default()
        .with_page("a.json", html)
        .with_page("b.json", html)
        .with_page("c.json", html);
    let probe = FakeProbe::new(&["/gone"]);
    let ctx = context(store, probe.clone());

    let results = detect_broken_links_from_crawl(
        &mapping(&[
            ("https://example.com/a", "a.json"),
            ("https://example.com/b", "b.json"),
            ("https://example.com/c", "c.json"),
        ]),
        &ctx,
    )
    .await;

    assert_eq!(results.len(), 3);
    let sources: Vec<&str> = results.iter().map(|r| r.url_from.as_str()).collect();
    assert_eq!(
        sources,
        vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"]
    );
    assert_eq!(probe.probed().len(), 2);
}

#[tokio::test]
async fn test_links_resolve_against_final_url() {
    let store = MemoryStore::default().with_redirected_page(
        "old.json",
        "https://www.example.com/new/",
        r#"<a href="missing">Missing</a>"#,
    );
    let probe = FakeProbe::new(&["/missing"]);
    let ctx = context(store, probe.clone());

    let results =
        detect_broken_links_from_crawl(&mapping(&[("https://example.com/old", "old.json")]), &ctx).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url_from, "https://example.com/old");
    assert_eq!(results[0].url_to, "https://www.example.com/new/missing");
}

#[tokio::test]
async fn test_bad_snapshots_do_not_abort_run() {
    let store = MemoryStore::default()
        .with_empty_body("empty.json")
        .with_failure("denied.json")
        .with_page("good.json", r#"<a href="/broken">Broken</a>"#);
    let probe = FakeProbe::new(&["/broken"]);
    let ctx = context(store, probe);

    let results = detect_broken_links_from_crawl(
        &mapping(&[
            ("https://example.com/1", "empty.json"),
            ("https://example.com/2", "denied.json"),
            ("https://example.com/3", "missing.json"),
            ("https://example.com/4", "good.json"),
        ]),
        &ctx,
    )
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url_from, "https://example.com/4");
}

#[tokio::test]
async fn test_scope_filters_pages_and_links() {
    let store = MemoryStore::default()
        .with_page("blog.json", r#"<a href="/blog/gone">In</a><a href="/shop/gone">Out</a>"#)
        .with_page("shop.json", r#"<a href="/blog/gone">In</a>"#);
    let probe = FakeProbe::new(&["/gone"]);
    let ctx = context(store, probe.clone()).with_scope(path_prefix_scope("https://example.com/blog"));

    let results = detect_broken_links_from_crawl(
        &mapping(&[
            ("https://example.com/blog/post", "blog.json"),
            ("https://example.com/shop/item", "shop.json"),
        ]),
        &ctx,
    )
    .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url_to, "https://example.com/blog/gone");
    assert_eq!(probe.probed(), vec!["https://example.com/blog/gone"]);
}

#[tokio::test]
async fn test_progress_callback_sees_every_page() {
    let seen: Arc<Mutex<Vec<(usize, usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let store = MemoryStore::default()
        .with_page("a.json", "<p>a</p>")
        .with_page("b.json", "<p>b</p>");
    let ctx = context(store, FakeProbe::new(&[])).with_progress_callback(Arc::new(
        move |position: usize, total: usize, url: &str| {
            seen_clone
                .lock()
                .unwrap()
                .push((position, total, url.to_string()));
        },
    ));

    detect_broken_links_from_crawl(
        &mapping(&[("https://example.com/b", "b.json"), ("https://example.com/a", "a.json")]),
        &ctx,
    )
    .await;

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            (1, 2, "https://example.com/a".to_string()),
            (2, 2, "https://example.com/b".to_string()),
        ]
    );
}

// ============================================================================
// Resumable batches
// ============================================================================

fn five_page_fixture() -> (MemoryStore, HashMap<String, String>) {
    let mut store = MemoryStore::default();
    let mut entries = Vec::new();
    for i in 0..5 {
        let key = format!("page{}.json", i);
        let html = format!(
            r#"<a href="/shared-broken">Shared</a><a href="/ok">Ok</a><a href="/only-{}-broken">Own</a>"#,
            i
        );
        store = store.with_page(&key, &html);
        entries.push((format!("https://example.com/page{}", i), key));
    }
    (store, entries.into_iter().collect())
}

#[tokio::test]
async fn test_batch_reports_cursor_and_counts() {
    let (store, pages) = five_page_fixture();
    let ctx = context(store, FakeProbe::new(&["broken"]));

    let result = detect_broken_links_from_crawl_batch(
        BatchOptions {
            page_mapping: pages,
            batch_start_index: 0,
            batch_size: 2,
            ..BatchOptions::default()
        },
        &ctx,
    )
    .await
    .unwrap();

    assert_eq!(result.pages_processed, 2);
    assert_eq!(result.pages_skipped, 0);
    assert!(result.has_more_pages);
    assert_eq!(result.next_batch_start_index, 2);
    assert_eq!(result.results.len(), 4);
    assert_eq!(result.stats.total_links_analyzed, 6);
    assert_eq!(result.stats.links_probed, 4);
    assert_eq!(result.stats.cache_hits_broken, 1);
    assert_eq!(result.stats.cache_hits_working, 1);
    assert_eq!(result.stats.cache_hit_rate, 33.3);
    assert_eq!(
        result.broken_urls_cache,
        vec![
            "https://example.com/only-0-broken",
            "https://example.com/only-1-broken",
            "https://example.com/shared-broken",
        ]
    );
    assert_eq!(result.working_urls_cache, vec!["https://example.com/ok"]);
}

#[tokio::test]
async fn test_carried_cache_avoids_reprobing() {
    let (store, pages) = five_page_fixture();
    let probe = FakeProbe::new(&["broken"]);
    let ctx = context(store, probe.clone());

    let state = BatchState {
        batch_start_index: 2,
        broken_urls_cache: vec!["https://example.com/shared-broken".to_string()],
        working_urls_cache: vec!["https://example.com/ok".to_string()],
    };
    let result = detect_broken_links_from_crawl_batch(BatchOptions::resume(pages, state, 2), &ctx)
        .await
        .unwrap();

    assert_eq!(
        probe.probed(),
        vec!["https://example.com/only-2-broken", "https://example.com/only-3-broken"]
    );
    assert_eq!(result.stats.cache_hits(), 4);
    assert_eq!(result.results.len(), 4);
}

#[tokio::test]
async fn test_batches_match_full_run() {
    let (store, pages) = five_page_fixture();
    let full_ctx = context(store, FakeProbe::new(&["broken"]));
    let full = detect_broken_links_from_crawl(&pages, &full_ctx).await;

    let (store, pages) = five_page_fixture();
    let probe = FakeProbe::new(&["broken"]);
    let ctx = context(store, probe.clone());

    let mut state = BatchState::default();
    let mut aggregate = Vec::new();
    let mut visited = 0;
    let mut calls = 0;
    loop {
        let result =
            detect_broken_links_from_crawl_batch(BatchOptions::resume(pages.clone(), state, 2), &ctx)
                .await
                .unwrap();
        calls += 1;
        visited += result.pages_processed;
        aggregate.extend(result.results.clone());
        state = result.next_state();
        if !result.has_more_pages {
            break;
        }
    }

    assert_eq!(calls, 3);
    assert_eq!(visited, 5);
    assert_eq!(aggregate, full);
    // shared-broken, ok and one own link per page
    assert_eq!(probe.probed().len(), 7);
}

#[tokio::test]
async fn test_batch_past_the_end_is_empty() {
    let (store, pages) = five_page_fixture();
    let ctx = context(store, FakeProbe::new(&["broken"]));

    let result = detect_broken_links_from_crawl_batch(
        BatchOptions {
            page_mapping: pages,
            batch_start_index: 10,
            batch_size: 5,
            ..BatchOptions::default()
        },
        &ctx,
    )
    .await
    .unwrap();

    assert_eq!(result.pages_processed, 0);
    assert!(!result.has_more_pages);
    assert!(result.results.is_empty());
    assert_eq!(result.stats.cache_hit_rate, 0.0);
}

#[tokio::test]
async fn test_skipped_pages_count_as_processed() {
    let store = MemoryStore::default()
        .with_failure("bad.json")
        .with_page("good.json", "<p>no links</p>");
    let ctx = context(store, FakeProbe::new(&[]));

    let result = detect_broken_links_from_crawl_batch(
        BatchOptions {
            page_mapping: mapping(&[
                ("https://example.com/a", "bad.json"),
                ("https://example.com/b", "good.json"),
                ("https://example.com/c", "absent.json"),
            ]),
            batch_start_index: 0,
            batch_size: 3,
            ..BatchOptions::default()
        },
        &ctx,
    )
    .await
    .unwrap();

    assert_eq!(result.pages_processed, 3);
    assert_eq!(result.pages_skipped, 2);
    assert!(!result.has_more_pages);
}

#[tokio::test]
async fn test_zero_batch_size_is_rejected() {
    let ctx = context(MemoryStore::default(), FakeProbe::new(&[]));
    let result = detect_broken_links_from_crawl_batch(BatchOptions::default(), &ctx).await;
    assert!(matches!(result, Err(AuditError::InvalidOptions(_))));
}

fn numbered_links(range: std::ops::Range<usize>) -> String {
    range
        .map(|i| format!(r#"<a href="/p{}">P{}</a>"#, i, i))
        .collect()
}

fn paced_context(store: MemoryStore, probe: Arc<FakeProbe>) -> AuditContext {
    AuditContext::new("site-1", BUCKET, Arc::new(store), probe).with_config(AuditConfig {
        probe_group_size: 5,
        probe_group_delay: Duration::from_millis(100),
        ..AuditConfig::default()
    })
}

#[tokio::test(start_paused = true)]
async fn test_probe_groups_respect_group_size() {
    let store = MemoryStore::default().with_page("a.json", &numbered_links(0..12));
    let probe = FakeProbe::with_latency(&[], Duration::from_millis(10));
    let ctx = paced_context(store, probe.clone());

    let started = Instant::now();
    let results =
        detect_broken_links_from_crawl(&mapping(&[("https://example.com/a", "a.json")]), &ctx).await;
    let elapsed = started.elapsed();

    assert!(results.is_empty());
    assert_eq!(probe.probed().len(), 12);
    assert_eq!(probe.peak_in_flight(), 5);
    // Three groups of checks with a pause between each pair
    assert!(elapsed >= Duration::from_millis(230), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(300), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_no_pause_around_groups_answered_from_cache() {
    let store = MemoryStore::default()
        .with_page("a.json", &numbered_links(0..5))
        .with_page("b.json", &(numbered_links(5..10) + &numbered_links(0..5)))
        .with_page("c.json", &(numbered_links(0..5) + &numbered_links(10..15)));
    let probe = FakeProbe::with_latency(&[], Duration::from_millis(10));
    let ctx = paced_context(store, probe.clone());

    let started = Instant::now();
    detect_broken_links_from_crawl(
        &mapping(&[
            ("https://example.com/a", "a.json"),
            ("https://example.com/b", "b.json"),
            ("https://example.com/c", "c.json"),
        ]),
        &ctx,
    )
    .await;
    let elapsed = started.elapsed();

    assert_eq!(probe.probed().len(), 15);
    assert!(probe.peak_in_flight() <= 5);
    // One network group per page and no pause next to the cached groups
    assert!(elapsed >= Duration::from_millis(30), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(100), "elapsed {:?}", elapsed);
}
