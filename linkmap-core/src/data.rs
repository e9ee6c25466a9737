use chrono::Utc;
use linkmap_crawler::{Edge, GraphSink, PageVisit};
use rusqlite::{Connection, Result, params};
use std::fs;
use std::path::Path;

/// Embedded SQLite store for the domain link graph.
///
/// Any backend offering insert-or-increment on a (source, target) pair
/// plus an incoming-edge scan would satisfy the crawler; this one keeps
/// everything in a single WAL-mode database file.
pub struct Database {
    conn: Connection,
}

/// Terminal state of a crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl Database {
    pub fn drop(path: &Path) {
        fs::remove_file(path).unwrap();
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Optimize for concurrent readers alongside the writer task
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Crawl runs
            CREATE TABLE IF NOT EXISTS crawl_runs (
                id TEXT PRIMARY KEY,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed', 'cancelled')),
                seeds TEXT NOT NULL,      -- JSON array
                workers INTEGER NOT NULL
            );

            -- The link graph: one row per distinct (source, target)
            -- pair, link_count bumped once per observed occurrence.
            CREATE TABLE IF NOT EXISTS edges (
                source TEXT NOT NULL,
                target TEXT NOT NULL,
                link_count INTEGER NOT NULL DEFAULT 1,
                first_seen TEXT NOT NULL,
                last_seen TEXT NOT NULL,
                PRIMARY KEY (source, target)
            );

            CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target);

            -- One row per fetched domain; a later fetch overwrites.
            CREATE TABLE IF NOT EXISTS pages (
                domain TEXT PRIMARY KEY,
                final_url TEXT,
                status_code INTEGER NOT NULL,
                title TEXT,
                links_found INTEGER NOT NULL DEFAULT 0,
                success INTEGER NOT NULL,
                fetched_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    // Run bookkeeping

    pub fn create_run(&self, seeds_json: &str, workers: usize) -> Result<String> {
        let run_id = uuid::Uuid::new_v4().to_string();

        self.conn.execute(
            "INSERT INTO crawl_runs (id, started_at, status, seeds, workers) VALUES (?1, ?2, 'running', ?3, ?4)",
            params![&run_id, Utc::now().to_rfc3339(), seeds_json, workers as i64],
        )?;

        Ok(run_id)
    }

    pub fn finish_run(&self, run_id: &str, status: RunStatus) -> Result<()> {
        self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), run_id],
        )?;
        Ok(())
    }

    pub fn run_status(&self, run_id: &str) -> Result<String> {
        self.conn.query_row(
            "SELECT status FROM crawl_runs WHERE id = ?1",
            params![run_id],
            |row| row.get(0),
        )
    }

    // Edge operations

    /// Insert-or-increment for one observed link occurrence. Calling
    /// this k times for a pair leaves link_count at exactly k; the
    /// increment happens inside the store, so it cannot lose updates.
    pub fn upsert_edge_increment(&self, source: &str, target: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO edges (source, target, link_count, first_seen, last_seen)
             VALUES (?1, ?2, 1, ?3, ?3)
             ON CONFLICT(source, target)
             DO UPDATE SET link_count = link_count + 1, last_seen = ?3",
            params![source, target, now],
        )?;
        Ok(())
    }

    /// Every source linking to `target` with its occurrence count,
    /// heaviest first, source name breaking ties.
    pub fn incoming_edges(&self, target: &str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT source, link_count FROM edges WHERE target = ?1
             ORDER BY link_count DESC, source ASC",
        )?;

        let rows = stmt
            .query_map(params![target], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// Number of distinct (source, target) pairs stored.
    pub fn edge_pair_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM edges", [], |row| row.get(0))
    }

    /// Total link occurrences across all pairs.
    pub fn link_total(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COALESCE(SUM(link_count), 0) FROM edges", [], |row| {
                row.get(0)
            })
    }

    // Page operations

    pub fn record_page_visit(&self, visit: &PageVisit) -> Result<()> {
        self.conn.execute(
            "INSERT INTO pages (domain, final_url, status_code, title, links_found, success, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(domain) DO UPDATE SET
                 final_url = excluded.final_url,
                 status_code = excluded.status_code,
                 title = excluded.title,
                 links_found = excluded.links_found,
                 success = excluded.success,
                 fetched_at = excluded.fetched_at",
            params![
                visit.domain.as_str(),
                &visit.final_url,
                visit.status_code as i64,
                &visit.title,
                visit.links_found as i64,
                visit.success,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn page_count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}

impl GraphSink for Database {
    fn record_edge(&mut self, edge: &Edge) -> anyhow::Result<()> {
        self.upsert_edge_increment(edge.source.as_str(), edge.target.as_str())?;
        Ok(())
    }

    fn record_page(&mut self, page: &PageVisit) -> anyhow::Result<()> {
        self.record_page_visit(page)?;
        Ok(())
    }
}
