use crate::error::ProbeErrorKind;
use serde::{Deserialize, Serialize};

/// Placeholder anchor text for links whose text is empty or whitespace.
pub const NO_TEXT: &str = "[no text]";

/// An internal link candidate found on one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLink {
    pub resolved_url: String,
    pub anchor_text: String,
}

impl ExtractedLink {
    pub fn new(resolved_url: String, anchor_text: &str) -> Self {
        let trimmed = anchor_text.trim();
        let anchor_text = if trimmed.is_empty() {
            NO_TEXT.to_string()
        } else {
            trimmed.to_string()
        };

        Self {
            resolved_url,
            anchor_text,
        }
    }
}

/// Which request produced the final verdict of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    Head,
    Get,
}

/// Outcome of probing a single URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheckOutcome {
    pub url: String,
    pub inaccessible: bool,
    pub method: ProbeMethod,
    pub status_code: Option<u16>,
    pub error_kind: Option<ProbeErrorKind>,
}

impl LinkCheckOutcome {
    pub fn accessible(url: &str, method: ProbeMethod, status_code: Option<u16>) -> Self {
        Self {
            url: url.to_string(),
            inaccessible: false,
            method,
            status_code,
            error_kind: None,
        }
    }

    pub fn inaccessible(
        url: &str,
        method: ProbeMethod,
        status_code: Option<u16>,
        error_kind: ProbeErrorKind,
    ) -> Self {
        Self {
            url: url.to_string(),
            inaccessible: true,
            method,
            status_code,
            error_kind: Some(error_kind),
        }
    }

    /// A timed out probe is reported as accessible but keeps its cause.
    pub fn timed_out(url: &str, method: ProbeMethod) -> Self {
        Self {
            url: url.to_string(),
            inaccessible: false,
            method,
            status_code: None,
            error_kind: Some(ProbeErrorKind::Timeout),
        }
    }
}
