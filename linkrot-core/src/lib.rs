pub mod audit;
pub mod error;
pub mod kpi;
pub mod merge;
pub mod model;
pub mod report;
pub mod snapshot;

pub use audit::{
    AuditConfig, AuditContext, AuditProgressCallback, BatchOptions, BatchResult, BatchStats,
    detect_broken_links_from_crawl, detect_broken_links_from_crawl_batch,
};
pub use error::{AuditError, Result};
pub use kpi::{KpiConfig, calculate_kpi_deltas, calculate_kpi_deltas_for_audit, calculate_priority};
pub use merge::merge_and_deduplicate;
pub use model::{BatchState, BrokenLinkRecord, KpiResult, PrioritizedLink, Priority, ScrapedPage};
pub use report::{AuditReport, ReportFormat, generate_audit_report};
pub use snapshot::{DirectorySnapshotStore, ScrapeResult, SnapshotStore, StoredSnapshot};
