pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod frontier;
pub mod normalize;
pub mod result;
pub mod writer;

pub use crawler::{Crawler, ProgressCallback, ShutdownHandle};
pub use error::{CrawlError, FetchError, NormalizeError};
pub use fetch::{FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::{Claim, Frontier};
pub use normalize::{Domain, normalize};
pub use result::{CrawlSummary, Edge, PageVisit};
pub use writer::{GraphSink, StoreEvent, WriterStats, spawn_writer};
