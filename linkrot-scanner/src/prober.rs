use crate::error::{ProbeErrorKind, Result, classify_error, classify_status};
use crate::result::{LinkCheckOutcome, ProbeMethod};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tunables for a single link probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub head_timeout: Duration,
    pub get_timeout: Duration,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            head_timeout: Duration::from_secs(5),
            get_timeout: Duration::from_secs(10),
            max_redirects: 5,
            user_agent: "linkrot/0.1 (+https://github.com/trapdoorsec/linkrot)".to_string(),
        }
    }
}

/// Decides whether a URL can be reached.
#[async_trait]
pub trait AccessibilityProbe: Send + Sync {
    async fn probe(&self, url: &str, site_id: &str) -> LinkCheckOutcome;

    async fn is_link_inaccessible(&self, url: &str, site_id: &str) -> bool {
        self.probe(url, site_id).await.inaccessible
    }
}

/// HTTP prober: HEAD first, GET when the server rejects or fails the HEAD.
///
/// Timeouts never count as broken. A slow page is more likely alive than gone,
/// and reporting it would be a false positive.
pub struct LinkProber {
    client: Client,
    config: ProbeConfig,
}

impl LinkProber {
    pub fn new() -> Result<Self> {
        Self::with_config(ProbeConfig::default())
    }

    pub fn with_config(config: ProbeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    async fn probe_with_get(&self, url: &str, site_id: &str) -> LinkCheckOutcome {
        let result = self
            .client
            .get(url)
            .timeout(self.config.get_timeout)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                match classify_status(status) {
                    None => LinkCheckOutcome::accessible(url, ProbeMethod::Get, Some(status)),
                    Some(kind) => {
                        if kind == ProbeErrorKind::ClientError {
                            warn!(site_id, url, status, "GET returned client error status");
                        } else {
                            debug!(site_id, url, status, "GET returned error status");
                        }
                        LinkCheckOutcome::inaccessible(url, ProbeMethod::Get, Some(status), kind)
                    }
                }
            }
            Err(e) => {
                let class = classify_error(&e);
                if class.is_timeout() {
                    info!(site_id, url, "GET timed out, treating link as accessible");
                    LinkCheckOutcome::timed_out(url, ProbeMethod::Get)
                } else {
                    error!(
                        site_id,
                        url,
                        kind = %class.kind,
                        error = %class.description,
                        "Link is inaccessible"
                    );
                    LinkCheckOutcome::inaccessible(url, ProbeMethod::Get, None, class.kind)
                }
            }
        }
    }
}

#[async_trait]
impl AccessibilityProbe for LinkProber {
    async fn probe(&self, url: &str, site_id: &str) -> LinkCheckOutcome {
        let result = self
            .client
            .head(url)
            .timeout(self.config.head_timeout)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status().as_u16();
                match classify_status(status) {
                    None => {
                        return LinkCheckOutcome::accessible(url, ProbeMethod::Head, Some(status));
                    }
                    Some(ProbeErrorKind::NotFound) => {
                        debug!(site_id, url, "HEAD returned 404");
                        return LinkCheckOutcome::inaccessible(
                            url,
                            ProbeMethod::Head,
                            Some(status),
                            ProbeErrorKind::NotFound,
                        );
                    }
                    Some(ProbeErrorKind::ClientError) => {
                        warn!(site_id, url, status, "HEAD returned client error status, retrying with GET");
                    }
                    Some(_) => {
                        debug!(site_id, url, status, "HEAD returned error status, retrying with GET");
                    }
                }
            }
            Err(e) => {
                let class = classify_error(&e);
                if class.is_timeout() {
                    info!(site_id, url, "HEAD timed out, treating link as accessible");
                    return LinkCheckOutcome::timed_out(url, ProbeMethod::Head);
                }
                debug!(site_id, url, error = %class.description, "HEAD failed, retrying with GET");
            }
        }

        self.probe_with_get(url, site_id).await
    }
}
