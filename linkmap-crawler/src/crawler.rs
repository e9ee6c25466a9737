use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::error::{CrawlError, Result};
use crate::extract::{extract_links, extract_title};
use crate::fetch::{DEFAULT_TIMEOUT_SECS, FetchedPage, HttpFetcher, PageFetcher};
use crate::frontier::{Claim, Frontier};
use crate::normalize::{Domain, normalize};
use crate::result::{CrawlSummary, Edge, PageVisit};
use crate::writer::StoreEvent;

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Handle for asking a running crawl to wind down. Workers finish or
/// abandon their current job and exit; nothing half-written survives,
/// because the writer drains whatever was already submitted.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    workers: usize,
    max_domains: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    shutdown: ShutdownHandle,
}

impl Crawler {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            fetcher: Arc::new(HttpFetcher::new(timeout_secs)),
            workers: 8,
            max_domains: None,
            progress_callback: None,
            shutdown: ShutdownHandle::default(),
        }
    }

    /// Swap the network fetcher out, e.g. for a canned one in tests.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Stop scheduling new domains once this many have been seen.
    pub fn with_max_domains(mut self, max_domains: Option<usize>) -> Self {
        self.max_domains = max_domains;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the crawl until the frontier drains (or shutdown is
    /// requested). Discovered edges and page visits stream out through
    /// `events`; pair them with `spawn_writer` and a `GraphSink`.
    ///
    /// The frontier is created fresh for this call and shared with the
    /// workers only, so repeated crawls on one `Crawler` are fully
    /// independent.
    pub async fn crawl(
        &self,
        seeds: Vec<Domain>,
        events: UnboundedSender<StoreEvent>,
    ) -> Result<CrawlSummary> {
        if seeds.is_empty() {
            return Err(CrawlError::NoSeeds);
        }

        info!(
            "starting crawl of {} seed(s) with {} workers",
            seeds.len(),
            self.workers
        );

        let frontier = Arc::new(Frontier::new(seeds, self.max_domains));
        let fetched = Arc::new(AtomicUsize::new(0));
        let failures = Arc::new(AtomicUsize::new(0));
        let edges = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            let frontier = frontier.clone();
            let fetcher = self.fetcher.clone();
            let events = events.clone();
            let progress = self.progress_callback.clone();
            let shutdown = self.shutdown.clone();
            let fetched = fetched.clone();
            let failures = failures.clone();
            let edges = edges.clone();

            handles.push(tokio::spawn(async move {
                debug!("worker {} started", worker_id);

                loop {
                    if shutdown.is_requested() {
                        debug!("worker {} stopping on shutdown request", worker_id);
                        break;
                    }

                    let domain = match frontier.claim_next() {
                        Claim::Drained => break,
                        Claim::Pending => {
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            continue;
                        }
                        Claim::Job(domain) => domain,
                    };

                    if let Some(ref callback) = progress {
                        callback(worker_id, domain.to_string());
                    }

                    match fetcher.fetch(&domain).await {
                        Ok(page) => {
                            fetched.fetch_add(1, Ordering::Relaxed);
                            let visit = process_page(&domain, &page, &frontier, &events, &edges);
                            let _ = events.send(StoreEvent::Page(visit));
                        }
                        Err(err) => {
                            failures.fetch_add(1, Ordering::Relaxed);
                            warn!("skipping {}: {}", domain, err);
                            let _ = events.send(StoreEvent::Page(PageVisit::failed(domain)));
                        }
                    }

                    frontier.complete();
                }

                debug!("worker {} finished", worker_id);
            }));
        }

        // The workers hold the remaining sender clones; dropping ours
        // lets the writer's channel close once they are done.
        drop(events);

        for joined in futures::future::join_all(handles).await {
            joined?;
        }

        let summary = CrawlSummary {
            domains_fetched: fetched.load(Ordering::Relaxed),
            fetch_failures: failures.load(Ordering::Relaxed),
            edges_submitted: edges.load(Ordering::Relaxed),
            domains_discovered: frontier.visited_count(),
            cancelled: self.shutdown.is_requested(),
        };

        info!(
            "crawl complete: {} fetched, {} failed, {} edges submitted",
            summary.domains_fetched, summary.fetch_failures, summary.edges_submitted
        );
        Ok(summary)
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract, normalize, and emit every outbound link on a fetched page,
/// expanding the frontier with targets not yet seen.
fn process_page(
    source: &Domain,
    page: &FetchedPage,
    frontier: &Frontier,
    events: &UnboundedSender<StoreEvent>,
    edge_count: &AtomicUsize,
) -> PageVisit {
    let mut links_found = 0;

    if page.is_html() {
        for href in extract_links(&page.body) {
            let target = match normalize(&href, &page.final_url) {
                Ok(target) => target,
                Err(err) => {
                    debug!("dropping link {:?}: {}", href, err);
                    continue;
                }
            };

            links_found += 1;
            edge_count.fetch_add(1, Ordering::Relaxed);
            let _ = events.send(StoreEvent::Edge(Edge {
                source: source.clone(),
                target: target.clone(),
            }));
            frontier.enqueue_if_new(target);
        }
    }

    PageVisit {
        domain: source.clone(),
        final_url: Some(page.final_url.to_string()),
        status_code: page.status,
        title: extract_title(&page.body),
        links_found,
        success: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::writer::{GraphSink, spawn_writer};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use url::Url;

    fn domain(s: &str) -> Domain {
        Domain::parse(s).unwrap()
    }

    /// Serves canned HTML per domain; unknown domains fail like dead
    /// hosts.
    struct StubFetcher {
        pages: HashMap<Domain, String>,
    }

    impl StubFetcher {
        fn new(pages: &[(&str, String)]) -> Arc<Self> {
            Arc::new(Self {
                pages: pages
                    .iter()
                    .map(|(d, html)| (domain(d), html.clone()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch(&self, domain: &Domain) -> std::result::Result<FetchedPage, FetchError> {
            match self.pages.get(domain) {
                Some(body) => Ok(FetchedPage {
                    final_url: Url::parse(&format!("https://{domain}/")).unwrap(),
                    status: 200,
                    content_type: Some("text/html".to_string()),
                    body: body.clone(),
                }),
                None => Err(FetchError::Network("no route to host".to_string())),
            }
        }
    }

    #[derive(Default, Clone)]
    struct MemorySink {
        edges: Arc<Mutex<HashMap<(String, String), i64>>>,
        pages: Arc<Mutex<Vec<PageVisit>>>,
    }

    impl GraphSink for MemorySink {
        fn record_edge(&mut self, edge: &Edge) -> anyhow::Result<()> {
            *self
                .edges
                .lock()
                .unwrap()
                .entry((edge.source.to_string(), edge.target.to_string()))
                .or_insert(0) += 1;
            Ok(())
        }

        fn record_page(&mut self, page: &PageVisit) -> anyhow::Result<()> {
            self.pages.lock().unwrap().push(page.clone());
            Ok(())
        }
    }

    fn links_page(hrefs: &[&str]) -> String {
        let mut html = String::from("<html><head><title>stub</title></head><body>");
        for href in hrefs {
            html.push_str(&format!(r#"<a href="{href}">link</a>"#));
        }
        html.push_str("</body></html>");
        html
    }

    async fn run_crawl(
        crawler: &Crawler,
        seeds: Vec<Domain>,
    ) -> (CrawlSummary, MemorySink, crate::writer::WriterStats) {
        let sink = MemorySink::default();
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = spawn_writer(Box::new(sink.clone()), rx);

        let summary = tokio::time::timeout(Duration::from_secs(30), crawler.crawl(seeds, tx))
            .await
            .expect("crawl must terminate")
            .unwrap();
        let stats = writer.await.unwrap();
        (summary, sink, stats)
    }

    #[tokio::test]
    async fn test_end_to_end_messenger_scenario() {
        let mut hrefs: Vec<String> = (0..11)
            .map(|i| format!("https://www.messenger.com/page{i}"))
            .collect();
        hrefs.push("https://messenger.com/t".to_string());
        let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();

        let fetcher = StubFetcher::new(&[("facebook.com", links_page(&href_refs))]);
        let crawler = Crawler::new().with_workers(1).with_fetcher(fetcher);

        let (summary, sink, stats) = run_crawl(&crawler, vec![domain("facebook.com")]).await;

        let edges = sink.edges.lock().unwrap();
        assert_eq!(
            edges[&("facebook.com".to_string(), "www.messenger.com".to_string())],
            11
        );
        assert_eq!(
            edges[&("facebook.com".to_string(), "messenger.com".to_string())],
            1
        );

        assert_eq!(stats.edges_recorded, 12);
        assert_eq!(summary.edges_submitted, 12);
        assert_eq!(summary.domains_fetched, 1);
        // The two messenger domains were discovered, attempted, and
        // failed (the stub has no pages for them).
        assert_eq!(summary.domains_discovered, 3);
        assert_eq!(summary.fetch_failures, 2);
    }

    #[tokio::test]
    async fn test_crawl_terminates_on_finite_cyclic_graph() {
        let fetcher = StubFetcher::new(&[
            ("a.com", links_page(&["https://b.com/"])),
            ("b.com", links_page(&["https://c.com/", "https://a.com/"])),
            ("c.com", links_page(&[])),
        ]);
        let crawler = Crawler::new().with_workers(4).with_fetcher(fetcher);

        let (summary, _, _) = run_crawl(&crawler, vec![domain("a.com")]).await;

        assert_eq!(summary.domains_fetched, 3);
        assert_eq!(summary.domains_discovered, 3);
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_each_domain_fetched_exactly_once() {
        // Every page links to every domain; without the visited-set
        // guard this would fetch endlessly.
        let all = ["a.com", "b.com", "c.com", "d.com"];
        let hrefs: Vec<String> = all.iter().map(|d| format!("https://{d}/")).collect();
        let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();

        let pages: Vec<(&str, String)> = all
            .iter()
            .map(|d| (*d, links_page(&href_refs)))
            .collect();
        let fetcher = StubFetcher::new(&pages);
        let crawler = Crawler::new().with_workers(8).with_fetcher(fetcher);

        let (summary, sink, _) = run_crawl(&crawler, vec![domain("a.com")]).await;

        assert_eq!(summary.domains_fetched, 4);
        let pages = sink.pages.lock().unwrap();
        let mut fetched: Vec<String> = pages.iter().map(|p| p.domain.to_string()).collect();
        fetched.sort();
        let before = fetched.len();
        fetched.dedup();
        assert_eq!(before, fetched.len(), "a domain was fetched twice");
    }

    #[tokio::test]
    async fn test_malformed_links_do_not_fail_the_crawl() {
        let fetcher = StubFetcher::new(&[(
            "seed.com",
            links_page(&[
                "javascript:void(0)",
                "mailto:a@b.com",
                "https://valid.example/page",
            ]),
        )]);
        let crawler = Crawler::new().with_workers(2).with_fetcher(fetcher);

        let (summary, sink, _) = run_crawl(&crawler, vec![domain("seed.com")]).await;

        let edges = sink.edges.lock().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(
            edges[&("seed.com".to_string(), "valid.example".to_string())],
            1
        );
        assert_eq!(summary.edges_submitted, 1);
    }

    #[tokio::test]
    async fn test_self_links_are_recorded() {
        let fetcher = StubFetcher::new(&[("self.com", links_page(&["https://self.com/about"]))]);
        let crawler = Crawler::new().with_workers(1).with_fetcher(fetcher);

        let (_, sink, _) = run_crawl(&crawler, vec![domain("self.com")]).await;

        let edges = sink.edges.lock().unwrap();
        assert_eq!(edges[&("self.com".to_string(), "self.com".to_string())], 1);
    }

    #[tokio::test]
    async fn test_max_domains_bounds_discovery() {
        let hrefs: Vec<String> = (0..50).map(|i| format!("https://d{i}.example/")).collect();
        let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
        let fetcher = StubFetcher::new(&[("seed.com", links_page(&href_refs))]);
        let crawler = Crawler::new()
            .with_workers(4)
            .with_max_domains(Some(5))
            .with_fetcher(fetcher);

        let (summary, _, _) = run_crawl(&crawler, vec![domain("seed.com")]).await;

        assert_eq!(summary.domains_discovered, 5);
    }

    #[tokio::test]
    async fn test_fetch_failures_are_contained() {
        let fetcher = StubFetcher::new(&[(
            "good.com",
            links_page(&["https://dead.example/", "https://also-dead.example/"]),
        )]);
        let crawler = Crawler::new().with_workers(2).with_fetcher(fetcher);

        let (summary, sink, _) = run_crawl(&crawler, vec![domain("good.com")]).await;

        assert_eq!(summary.domains_fetched, 1);
        assert_eq!(summary.fetch_failures, 2);

        let pages = sink.pages.lock().unwrap();
        let failed: Vec<_> = pages.iter().filter(|p| !p.success).collect();
        assert_eq!(failed.len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_request_stops_workers() {
        let fetcher = StubFetcher::new(&[("seed.com", links_page(&[]))]);
        let crawler = Crawler::new().with_workers(2).with_fetcher(fetcher);

        crawler.shutdown_handle().request();
        let (summary, _, _) = run_crawl(&crawler, vec![domain("seed.com")]).await;

        assert!(summary.cancelled);
        assert_eq!(summary.domains_fetched, 0);
    }

    #[tokio::test]
    async fn test_empty_seed_list_is_an_error() {
        let crawler = Crawler::new().with_workers(1);
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(matches!(
            crawler.crawl(Vec::new(), tx).await,
            Err(CrawlError::NoSeeds)
        ));
    }

    #[tokio::test]
    async fn test_non_html_pages_yield_no_edges() {
        struct JsonFetcher;

        #[async_trait]
        impl PageFetcher for JsonFetcher {
            async fn fetch(
                &self,
                domain: &Domain,
            ) -> std::result::Result<FetchedPage, FetchError> {
                Ok(FetchedPage {
                    final_url: Url::parse(&format!("https://{domain}/")).unwrap(),
                    status: 200,
                    content_type: Some("application/json".to_string()),
                    body: r#"{"href": "https://not-a-link.example/"}"#.to_string(),
                })
            }
        }

        let crawler = Crawler::new().with_workers(1).with_fetcher(Arc::new(JsonFetcher));
        let (summary, sink, _) = run_crawl(&crawler, vec![domain("api.example")]).await;

        assert_eq!(summary.edges_submitted, 0);
        assert!(sink.edges.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_title_recorded_on_page_visit() {
        let fetcher = StubFetcher::new(&[("seed.com", links_page(&[]))]);
        let crawler = Crawler::new().with_workers(1).with_fetcher(fetcher);

        let (_, sink, _) = run_crawl(&crawler, vec![domain("seed.com")]).await;

        let pages = sink.pages.lock().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].title.as_deref(), Some("stub"));
        assert_eq!(pages[0].status_code, 200);
    }
}
