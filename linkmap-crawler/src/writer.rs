use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::result::{Edge, PageVisit};

/// Everything workers push toward persistence.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    Edge(Edge),
    Page(PageVisit),
}

/// Ingestion half of the persistence contract.
///
/// `record_edge` must be an insert-or-increment on the (source, target)
/// pair; calling it k times for one pair must leave a stored count of
/// exactly k.
pub trait GraphSink: Send + 'static {
    fn record_edge(&mut self, edge: &Edge) -> anyhow::Result<()>;
    fn record_page(&mut self, page: &PageVisit) -> anyhow::Result<()>;
}

/// What the writer task had seen by the time the channel closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub edges_recorded: u64,
    pub pages_recorded: u64,
    pub write_errors: u64,
}

/// Spawn the single-owner writer task.
///
/// All store mutation funnels through this one task, so concurrent
/// workers can never lose an increment to interleaving. A failed write
/// is logged and dropped; the crawl goes on without it. The task exits
/// once every sender handle is gone and the channel drains.
pub fn spawn_writer(
    mut sink: Box<dyn GraphSink>,
    mut events: UnboundedReceiver<StoreEvent>,
) -> JoinHandle<WriterStats> {
    tokio::spawn(async move {
        let mut stats = WriterStats::default();

        while let Some(event) = events.recv().await {
            let applied = match &event {
                StoreEvent::Edge(edge) => sink.record_edge(edge),
                StoreEvent::Page(page) => sink.record_page(page),
            };
            match applied {
                Ok(()) => match event {
                    StoreEvent::Edge(_) => stats.edges_recorded += 1,
                    StoreEvent::Page(_) => stats.pages_recorded += 1,
                },
                Err(err) => {
                    stats.write_errors += 1;
                    warn!("dropping failed write: {}", err);
                }
            }
        }

        debug!(
            "writer drained: {} edges, {} pages, {} errors",
            stats.edges_recorded, stats.pages_recorded, stats.write_errors
        );
        stats
    })
}
