use crate::model::BrokenLinkRecord;
use std::collections::HashMap;

/// Combine crawl-detected broken links with the ones reported by traffic
/// analytics.
///
/// Records are keyed by `(url_from, url_to)`. When both sources report a pair,
/// the traffic record replaces the crawl record in place, extra fields and all.
/// Pairs seen only once pass through untouched. Output order is first
/// appearance: crawl pairs first, then traffic-only pairs.
pub fn merge_and_deduplicate(
    crawl_links: Vec<BrokenLinkRecord>,
    traffic_links: Vec<BrokenLinkRecord>,
) -> Vec<BrokenLinkRecord> {
    let mut merged: Vec<BrokenLinkRecord> = Vec::with_capacity(crawl_links.len() + traffic_links.len());
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for link in crawl_links.into_iter().chain(traffic_links) {
        let key = (link.url_from.clone(), link.url_to.clone());
        match index.get(&key) {
            Some(&position) => merged[position] = link,
            None => {
                index.insert(key, merged.len());
                merged.push(link);
            }
        }
    }

    merged
}
