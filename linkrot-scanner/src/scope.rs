use crate::extract::site_host;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Decides whether a page or link URL belongs to the audited area of a site.
pub type ScopePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Scope that accepts every URL.
pub fn allow_all() -> ScopePredicate {
    Arc::new(|_url: &str| true)
}

/// Scope limited to the host and path of `base_url`.
///
/// `https://example.com/blog` admits `https://www.example.com/blog` and
/// `/blog/post`, but not `/blogroll`. Falls back to [`allow_all`] when the
/// base URL cannot be parsed.
pub fn path_prefix_scope(base_url: &str) -> ScopePredicate {
    let Ok(base) = Url::parse(base_url) else {
        warn!(base_url, "Invalid audit scope URL, auditing every URL");
        return allow_all();
    };
    let Some(host) = site_host(&base) else {
        warn!(base_url, "Audit scope URL has no host, auditing every URL");
        return allow_all();
    };
    let prefix = base.path().trim_end_matches('/').to_string();

    Arc::new(move |url: &str| {
        let Ok(candidate) = Url::parse(url) else {
            return false;
        };
        if site_host(&candidate).as_deref() != Some(host.as_str()) {
            return false;
        }
        if prefix.is_empty() {
            return true;
        }
        let path = candidate.path();
        path == prefix
            || path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    })
}
