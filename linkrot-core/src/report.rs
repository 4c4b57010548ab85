// Report generation for audit results

use crate::error::Result;
use crate::kpi::{KpiConfig, calculate_kpi_deltas, calculate_priority};
use crate::model::{BrokenLinkRecord, KpiResult, PrioritizedLink, Priority};
use chrono::Utc;
use colored::Colorize;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub generated_at: String,
    pub kpi: KpiResult,
    pub links: Vec<PrioritizedLink>,
}

impl AuditReport {
    pub fn build(links: &[BrokenLinkRecord], config: &KpiConfig) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            kpi: calculate_kpi_deltas(links, config),
            links: calculate_priority(links),
        }
    }
}

pub fn generate_audit_report(
    links: &[BrokenLinkRecord],
    config: &KpiConfig,
    format: ReportFormat,
) -> Result<String> {
    let report = AuditReport::build(links, config);
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => Ok(render_text(&report)),
    }
}

fn priority_label(priority: Priority) -> String {
    let label = format!("[{}]", priority.as_str().to_uppercase());
    match priority {
        Priority::High => label.red().bold().to_string(),
        Priority::Medium => label.yellow().to_string(),
        Priority::Low => label.normal().to_string(),
    }
}

fn render_text(report: &AuditReport) -> String {
    let mut out = String::new();
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Broken link audit\n");
    out.push_str(&format!("  Generated: {}\n", report.generated_at));
    out.push_str(&format!("  Broken links: {}\n", report.links.len()));
    out.push_str(&format!(
        "  Projected traffic lost: {:.2}\n",
        report.kpi.projected_traffic_lost
    ));
    out.push_str(&format!(
        "  Projected traffic value: {:.2}\n",
        report.kpi.projected_traffic_value
    ));
    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    if report.links.is_empty() {
        out.push_str("No broken internal links found.\n");
        return out;
    }

    for entry in &report.links {
        let link = &entry.link;
        out.push_str(&format!(
            "  {} {} -> {}\n",
            priority_label(entry.priority),
            link.url_from,
            link.url_to
        ));
        out.push_str(&format!(
            "      {} \"{}\"  traffic: {}\n",
            "anchor".dimmed(),
            link.anchor_text,
            link.traffic_domain
        ));
    }

    out
}
