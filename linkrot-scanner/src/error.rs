use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;

/// Coarse category of a failed probe, derived either from an HTTP status or
/// from a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    Timeout,
    NotFound,
    ClientError,
    ServerError,
    NetworkError,
    Unknown,
}

impl ProbeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeErrorKind::Timeout => "timeout",
            ProbeErrorKind::NotFound => "not_found",
            ProbeErrorKind::ClientError => "client_error",
            ProbeErrorKind::ServerError => "server_error",
            ProbeErrorKind::NetworkError => "network_error",
            ProbeErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error plus a best-effort, log-friendly description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorClass {
    pub kind: ProbeErrorKind,
    pub description: String,
}

impl ErrorClass {
    pub fn is_timeout(&self) -> bool {
        self.kind == ProbeErrorKind::Timeout
    }
}

/// Map a non-2xx HTTP status onto a probe error kind. Returns `None` for
/// success codes.
pub fn classify_status(status: u16) -> Option<ProbeErrorKind> {
    match status {
        200..=299 => None,
        404 => Some(ProbeErrorKind::NotFound),
        400..=499 => Some(ProbeErrorKind::ClientError),
        500..=599 => Some(ProbeErrorKind::ServerError),
        _ => Some(ProbeErrorKind::Unknown),
    }
}

/// Classify any error by walking its `source()` chain.
///
/// Timeouts are recognised from reqwest's own flag, an io `TimedOut` kind, or
/// a message mentioning "timeout"/"timed out" anywhere in the chain. The text
/// of a `reqwest::Error` is skipped since it contains the request URL.
pub fn classify_error(error: &(dyn StdError + 'static)) -> ErrorClass {
    let mut fields: Vec<String> = Vec::new();
    let mut timeout = false;
    let mut status_kind = None;
    let mut transport = false;

    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        let reqwest_error = err.downcast_ref::<reqwest::Error>();
        if let Some(req) = reqwest_error {
            timeout |= req.is_timeout();
            transport = true;
            fields.push(format!("type={}", reqwest_family(req)));
            if let Some(status) = req.status() {
                status_kind = classify_status(status.as_u16());
            }
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            timeout |= io.kind() == std::io::ErrorKind::TimedOut;
            transport = true;
            fields.push(format!("code={:?}", io.kind()));
            if let Some(errno) = io.raw_os_error() {
                fields.push(format!("errno={}", errno));
            }
        }

        // reqwest's message embeds the request URL, only its flag counts
        if reqwest_error.is_none() {
            let message = err.to_string().to_lowercase();
            if message.contains("timeout") || message.contains("timed out") {
                timeout = true;
            }
        }

        current = err.source();
    }

    let message = error.to_string();
    if !message.trim().is_empty() {
        fields.push(format!("message={}", message.trim()));
    }

    let kind = if timeout {
        ProbeErrorKind::Timeout
    } else if let Some(kind) = status_kind {
        kind
    } else if transport {
        ProbeErrorKind::NetworkError
    } else {
        ProbeErrorKind::Unknown
    };

    let description = if fields.is_empty() {
        "Unknown error".to_string()
    } else {
        fields.join(", ")
    };

    ErrorClass { kind, description }
}

fn reqwest_family(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else if error.is_redirect() {
        "redirect"
    } else if error.is_body() {
        "body"
    } else if error.is_decode() {
        "decode"
    } else if error.is_status() {
        "status"
    } else if error.is_builder() {
        "builder"
    } else if error.is_request() {
        "request"
    } else {
        "unknown"
    }
}
