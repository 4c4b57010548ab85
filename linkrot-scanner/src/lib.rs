pub mod cache;
pub mod error;
pub mod extract;
pub mod prober;
pub mod result;
pub mod scope;

pub use cache::{CachedVerdict, ProbeCache};
pub use error::{ErrorClass, ProbeErrorKind, ScanError, classify_error, classify_status};
pub use extract::{extract_internal_links, is_same_site};
pub use prober::{AccessibilityProbe, LinkProber, ProbeConfig};
pub use result::{ExtractedLink, LinkCheckOutcome, NO_TEXT, ProbeMethod};
pub use scope::{ScopePredicate, allow_all, path_prefix_scope};
