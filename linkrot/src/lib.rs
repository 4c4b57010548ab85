// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    expand_path, load_batch_state, load_page_mapping, load_traffic_links, parse_mapping_line,
    save_batch_state,
};

// Re-export audit functionality from linkrot-core
pub use linkrot_core::{
    AuditConfig, AuditContext, BatchOptions, detect_broken_links_from_crawl,
    detect_broken_links_from_crawl_batch, merge_and_deduplicate,
};
