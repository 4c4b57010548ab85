use std::collections::HashSet;

/// Cached verdict for a previously probed URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachedVerdict {
    Broken,
    Working,
}

/// Memo of probe verdicts, keyed by fully-qualified URL.
///
/// A URL lives in at most one of the two sets. The cache is plain data: it is
/// built from the arrays a caller carries between batches and turned back into
/// arrays at the end of each batch.
#[derive(Debug, Clone, Default)]
pub struct ProbeCache {
    broken: HashSet<String>,
    working: HashSet<String>,
}

impl ProbeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cache from carried-over arrays. A URL listed in both arrays
    /// is treated as broken.
    pub fn from_parts<B, W>(broken: B, working: W) -> Self
    where
        B: IntoIterator<Item = String>,
        W: IntoIterator<Item = String>,
    {
        let broken: HashSet<String> = broken.into_iter().collect();
        let working = working
            .into_iter()
            .filter(|url| !broken.contains(url))
            .collect();
        Self { broken, working }
    }

    pub fn lookup(&self, url: &str) -> Option<CachedVerdict> {
        if self.broken.contains(url) {
            Some(CachedVerdict::Broken)
        } else if self.working.contains(url) {
            Some(CachedVerdict::Working)
        } else {
            None
        }
    }

    pub fn record(&mut self, url: &str, inaccessible: bool) {
        if inaccessible {
            self.working.remove(url);
            self.broken.insert(url.to_string());
        } else {
            self.broken.remove(url);
            self.working.insert(url.to_string());
        }
    }

    pub fn broken_len(&self) -> usize {
        self.broken.len()
    }

    pub fn working_len(&self) -> usize {
        self.working.len()
    }

    /// Sorted `(broken, working)` arrays for handing back to the caller.
    pub fn into_parts(self) -> (Vec<String>, Vec<String>) {
        let mut broken: Vec<String> = self.broken.into_iter().collect();
        let mut working: Vec<String> = self.working.into_iter().collect();
        broken.sort();
        working.sort();
        (broken, working)
    }
}
