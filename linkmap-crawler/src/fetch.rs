use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::normalize::Domain;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("linkmap/", env!("CARGO_PKG_VERSION"));

/// One successfully retrieved root page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Where the request landed after redirects. Hrefs on the page are
    /// resolved against this, not the domain we asked for.
    pub final_url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl FetchedPage {
    /// Only HTML bodies are worth handing to the link extractor.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}

/// Retrieves the root page of a domain. Behind a trait so tests can
/// substitute a canned fetcher for the real network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, domain: &Domain) -> Result<FetchedPage, FetchError>;
}

/// reqwest-backed fetcher. Tries `https://{domain}/` first and retries
/// over plain `http://` when the secure attempt dies at the network
/// level. An HTTP status or a timeout is a real answer and is never
/// retried.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs((timeout_secs / 2).max(1)))
            .pool_max_idle_per_host(50)
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    async fn get(&self, url: &str) -> Result<FetchedPage, FetchError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await.map_err(FetchError::from_reqwest)?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, domain: &Domain) -> Result<FetchedPage, FetchError> {
        match self.get(&format!("https://{domain}/")).await {
            Ok(page) => Ok(page),
            Err(err @ (FetchError::Status(_) | FetchError::Timeout)) => Err(err),
            Err(FetchError::Network(_)) => self.get(&format!("http://{domain}/")).await,
        }
    }
}
