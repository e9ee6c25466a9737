use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use linkmap_crawler::{
    Crawler, CrawlSummary, Domain, ProgressCallback, StoreEvent, WriterStats, spawn_writer,
};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

use crate::data::{Database, RunStatus};

/// Everything a crawl invocation needs to know.
pub struct CrawlOptions {
    pub seeds: Vec<String>,
    pub workers: usize,
    pub timeout_secs: u64,
    /// Stop scheduling new domains past this many. None crawls until
    /// the frontier drains on its own.
    pub max_domains: Option<usize>,
    pub show_progress: bool,
}

/// What `execute_crawl` hands back for reporting.
#[derive(Debug)]
pub struct CrawlReport {
    pub summary: CrawlSummary,
    pub writer: WriterStats,
    pub elapsed: Duration,
    pub run_id: String,
}

/// Open the store, wire frontier, workers, and writer together, run the
/// crawl to exhaustion, and leave a finished run row behind.
///
/// An unopenable store or an invalid seed aborts here, before any
/// crawling starts; everything after that point is contained per-job.
pub async fn execute_crawl(db_path: &Path, options: CrawlOptions) -> Result<CrawlReport> {
    let CrawlOptions {
        seeds,
        workers,
        timeout_secs,
        max_domains,
        show_progress,
    } = options;

    let seeds: Vec<Domain> = seeds
        .iter()
        .map(|seed| {
            Domain::parse(seed).with_context(|| format!("invalid seed domain {seed:?}"))
        })
        .collect::<Result<_>>()?;

    // Two connections on one WAL database: the writer task owns one
    // outright, run bookkeeping keeps the other.
    let bookkeeping = Database::new(db_path)
        .with_context(|| format!("cannot open link store at {}", db_path.display()))?;
    let sink = Database::new(db_path)
        .with_context(|| format!("cannot open link store at {}", db_path.display()))?;

    let seed_names: Vec<String> = seeds.iter().map(Domain::to_string).collect();
    let seeds_json = serde_json::to_string(&seed_names)?;
    let run_id = bookkeeping.create_run(&seeds_json, workers)?;
    info!("crawl run {} started", run_id);

    let (events_tx, events_rx) = mpsc::unbounded_channel::<StoreEvent>();
    let writer = spawn_writer(Box::new(sink), events_rx);

    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let mut crawler = Crawler::with_timeout(timeout_secs)
        .with_workers(workers)
        .with_max_domains(max_domains);

    if let Some(ref pb) = progress_bar {
        let pb = pb.clone();
        let claimed = Arc::new(AtomicUsize::new(0));
        let callback: ProgressCallback = Arc::new(move |_worker_id, domain| {
            let count = claimed.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!("Crawling... {count} domains claimed ({domain})"));
            pb.tick();
        });
        crawler = crawler.with_progress_callback(callback);
    }

    // An interrupt flips the shutdown flag; workers wind down after
    // their current job and the writer drains whatever was submitted.
    let shutdown = crawler.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, winding down crawl");
            shutdown.request();
        }
    });

    let started = Instant::now();
    let summary = match crawler.crawl(seeds, events_tx).await {
        Ok(summary) => summary,
        Err(err) => {
            bookkeeping.finish_run(&run_id, RunStatus::Failed)?;
            return Err(err.into());
        }
    };

    let writer_stats = writer.await.context("graph writer task failed")?;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let status = if summary.cancelled {
        RunStatus::Cancelled
    } else {
        RunStatus::Completed
    };
    bookkeeping.finish_run(&run_id, status)?;
    info!("crawl run {} {}", run_id, status.as_str());

    Ok(CrawlReport {
        summary,
        writer: writer_stats,
        elapsed: started.elapsed(),
        run_id,
    })
}

/// Render the post-crawl summary block.
pub fn generate_crawl_report(report: &CrawlReport) -> String {
    let mut out = String::new();
    out.push_str("Summary:\n");
    out.push_str(&format!(
        "  Domains fetched:    {}\n",
        report.summary.domains_fetched
    ));
    out.push_str(&format!(
        "  Fetch failures:     {}\n",
        report.summary.fetch_failures
    ));
    out.push_str(&format!(
        "  Domains discovered: {}\n",
        report.summary.domains_discovered
    ));
    out.push_str(&format!(
        "  Links recorded:     {}\n",
        report.writer.edges_recorded
    ));
    if report.writer.write_errors > 0 {
        out.push_str(&format!(
            "  Write errors:       {}\n",
            report.writer.write_errors
        ));
    }
    out.push_str(&format!("  Elapsed:            {:.1?}\n", report.elapsed));
    if report.summary.cancelled {
        out.push_str("  (crawl interrupted before the frontier drained)\n");
    }
    out
}
