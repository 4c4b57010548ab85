// Traffic impact projection and priority ranking for broken links

use crate::model::{BrokenLinkRecord, KpiResult, PrioritizedLink, Priority};
use std::cmp::Ordering;

/// Parameters for turning broken links into projected impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KpiConfig {
    /// Share of a linking page's traffic assumed lost per broken link
    pub traffic_loss_multiplier: f64,
    pub cost_per_click: f64,
    /// Only the highest-traffic links count towards the projection
    pub top_n: usize,
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            traffic_loss_multiplier: 0.01,
            cost_per_click: 1.0,
            top_n: 10,
        }
    }
}

fn by_traffic_desc(a: &BrokenLinkRecord, b: &BrokenLinkRecord) -> Ordering {
    b.traffic_domain
        .partial_cmp(&a.traffic_domain)
        .unwrap_or(Ordering::Equal)
}

/// Projected traffic lost and its value, using the default parameters.
pub fn calculate_kpi_deltas_for_audit(broken_links: &[BrokenLinkRecord]) -> KpiResult {
    calculate_kpi_deltas(broken_links, &KpiConfig::default())
}

pub fn calculate_kpi_deltas(broken_links: &[BrokenLinkRecord], config: &KpiConfig) -> KpiResult {
    let mut ranked: Vec<&BrokenLinkRecord> = broken_links.iter().collect();
    ranked.sort_by(|a, b| by_traffic_desc(a, b));

    let projected_traffic_lost: f64 = ranked
        .iter()
        .take(config.top_n)
        .map(|link| link.traffic_domain * config.traffic_loss_multiplier)
        .sum();

    KpiResult {
        projected_traffic_lost,
        projected_traffic_value: projected_traffic_lost * config.cost_per_click,
    }
}

/// Rank links by traffic and label them by quartile.
///
/// The top quarter (at least one link) is `High`, up to the half mark is
/// `Medium`, the rest `Low`. The input is left untouched; a `priority` field
/// carried in `extra` is dropped from the output.
pub fn calculate_priority(links: &[BrokenLinkRecord]) -> Vec<PrioritizedLink> {
    let mut sorted = links.to_vec();
    sorted.sort_by(by_traffic_desc);

    let total = sorted.len();
    let quarter = (total / 4).max(1);
    let half = total / 2;

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, mut link)| {
            // The computed priority replaces any value carried in from traffic data
            link.extra.remove("priority");
            let priority = if i < quarter {
                Priority::High
            } else if i < half {
                Priority::Medium
            } else {
                Priority::Low
            };
            PrioritizedLink { link, priority }
        })
        .collect()
}
