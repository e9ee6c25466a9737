use serde::{Deserialize, Serialize};

use crate::normalize::Domain;

/// A directed "links-to" observation: a page on `source` linked to
/// `target`. The store keeps one row per distinct pair and counts how
/// often the pair was observed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: Domain,
    pub target: Domain,
}

/// Outcome of fetching one domain, persisted alongside its edges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVisit {
    pub domain: Domain,
    /// Where the fetch actually landed after redirects. None when the
    /// fetch never got an answer.
    pub final_url: Option<String>,
    pub status_code: u16,
    pub title: Option<String>,
    pub links_found: usize,
    pub success: bool,
}

impl PageVisit {
    pub fn failed(domain: Domain) -> Self {
        Self {
            domain,
            final_url: None,
            status_code: 0,
            title: None,
            links_found: 0,
            success: false,
        }
    }
}

/// Totals for one finished crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    /// Domains whose root page came back successfully.
    pub domains_fetched: usize,
    /// Domains whose fetch failed (timeout, bad status, network).
    pub fetch_failures: usize,
    /// Raw link occurrences submitted to the graph writer.
    pub edges_submitted: usize,
    /// Size of the visited set when the frontier drained, seeds
    /// included.
    pub domains_discovered: usize,
    /// True when the crawl stopped on a shutdown request rather than a
    /// drained frontier.
    pub cancelled: bool,
}
