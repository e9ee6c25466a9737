use thiserror::Error;

/// Why a raw href could not be reduced to a crawlable domain.
///
/// These never abort anything: the caller drops the offending link and
/// keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("unparseable link: {0:?}")]
    Syntax(String),

    #[error("no host in link: {0:?}")]
    NoHost(String),
}

/// Why fetching a domain's root page failed. Every variant is non-fatal
/// to the crawl; the owning worker logs it and moves to the next job.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("server answered with status {0}")]
    Status(u16),

    #[error("network failure: {0}")]
    Network(String),
}

impl FetchError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Failure of a crawl as a whole, as opposed to per-job failures.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("no seed domains supplied")]
    NoSeeds,

    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
