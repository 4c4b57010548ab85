use crate::result::ExtractedLink;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// Extract the internal links of one page.
///
/// Links are resolved against `base_url` (the page's final URL when it was
/// redirected). Anchors inside `<header>` or `<footer>` are ignored, as are
/// pure fragment links, hrefs that fail to resolve, and anything pointing at
/// another origin. The result is deduplicated by resolved URL, keeping the
/// first anchor text seen.
pub fn extract_internal_links(html: &str, base_url: &str) -> Vec<ExtractedLink> {
    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            warn!(base_url, error = %e, "Invalid base URL, no links extracted");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        if in_boilerplate_region(&element) {
            debug!(href, "Skipping header/footer link");
            continue;
        }

        let resolved = match base.join(href) {
            Ok(url) => url,
            Err(e) => {
                debug!(href, base_url, error = %e, "Skipping malformed link");
                continue;
            }
        };

        if !is_same_site(&base, &resolved) {
            continue;
        }

        let resolved = resolved.to_string();
        if !seen.insert(resolved.clone()) {
            continue;
        }

        let text: String = element.text().collect();
        links.push(ExtractedLink::new(resolved, &text));
    }

    links
}

/// Host name with a leading `www.` removed, lower-cased.
pub fn site_host(url: &Url) -> Option<String> {
    url.host_str().map(|host| {
        let host = host.to_ascii_lowercase();
        match host.strip_prefix("www.") {
            Some(bare) => bare.to_string(),
            None => host,
        }
    })
}

/// Origin comparison that treats `www.example.com` and `example.com` as the
/// same site.
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    if !matches!(b.scheme(), "http" | "https") {
        return false;
    }
    if a.scheme() != b.scheme() || a.port_or_known_default() != b.port_or_known_default() {
        return false;
    }
    match (site_host(a), site_host(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn in_boilerplate_region(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "header" | "footer"))
}
