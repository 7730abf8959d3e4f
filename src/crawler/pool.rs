//! Bounded concurrent content fetching
//!
//! Two levels of concurrency:
//! - URLs are split into fixed-size chunks and handed to a small pool of OS
//!   worker threads through a shared queue
//! - each worker drives its own current-thread runtime and fans a chunk out
//!   into one task per URL, bounded by a semaphore
//!
//! Results flow back to the caller's runtime over a channel and are merged as
//! each chunk completes. A failed URL is simply absent from the result. A
//! worker that panics while processing a chunk loses only that chunk.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchResult, PageSource, SourceFactory};
use crate::crawler::parser::extract_readable_content;
use crate::crawler::ContentRecord;
use crate::AtlasError;
use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

pub const DEFAULT_CHUNK_SIZE: usize = 3;
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Worker pool sizing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub chunk_size: usize,
    pub max_concurrent_requests: usize,
    /// 0 means available parallelism minus one
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT,
            workers: 0,
        }
    }
}

impl PoolConfig {
    pub fn from_crawler(config: &CrawlerConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            max_concurrent_requests: config.max_concurrent_requests,
            workers: config.workers,
        }
    }

    /// Number of worker threads for a given number of chunks
    pub fn worker_count(&self, chunks: usize) -> usize {
        let wanted = if self.workers == 0 {
            default_worker_count()
        } else {
            self.workers
        };
        wanted.min(chunks).max(1)
    }
}

/// Available parallelism minus one, at least one
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}

/// Outcome counters for one `fetch_all` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchStatistics {
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub crashed_chunks: usize,
    pub elapsed: Duration,
}

impl FetchStatistics {
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.succeeded as f64 / secs
        } else {
            0.0
        }
    }
}

struct ChunkOutcome {
    worker_id: usize,
    requested: usize,
    records: Vec<ContentRecord>,
    crashed: bool,
}

type ChunkQueue = Arc<Mutex<VecDeque<Vec<String>>>>;

/// Runs one chunk to completion on a worker's runtime, with a request limit
type ChunkRunner =
    Arc<dyn Fn(&Runtime, Arc<dyn PageSource>, Vec<String>, usize) -> Vec<ContentRecord> + Send + Sync>;

/// Fetches readable content for many URLs with bounded concurrency
pub struct ContentFetcher {
    config: PoolConfig,
    factory: SourceFactory,
    runner: ChunkRunner,
}

impl ContentFetcher {
    /// Creates a fetcher that builds one page source per worker
    pub fn new(config: PoolConfig, factory: SourceFactory) -> Self {
        let runner: ChunkRunner = Arc::new(run_chunk);
        Self {
            config,
            factory,
            runner,
        }
    }

    #[cfg(test)]
    fn with_chunk_runner(mut self, runner: ChunkRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Creates a fetcher whose workers all share one page source
    pub fn with_source(config: PoolConfig, source: Arc<dyn PageSource>) -> Self {
        let factory: SourceFactory =
            Arc::new(move || -> Result<Arc<dyn PageSource>, AtlasError> { Ok(Arc::clone(&source)) });
        Self::new(config, factory)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Fetches every URL, returning content for those that succeeded
    ///
    /// Duplicate URLs are fetched once. Never fails: every problem shows up as
    /// a missing entry.
    pub async fn fetch_all(&self, urls: &[String]) -> HashMap<String, ContentRecord> {
        self.fetch_all_with_stats(urls).await.0
    }

    /// Same as `fetch_all`, also returning outcome counters
    pub async fn fetch_all_with_stats(
        &self,
        urls: &[String],
    ) -> (HashMap<String, ContentRecord>, FetchStatistics) {
        let start = Instant::now();
        let unique = dedupe(urls);
        let mut stats = FetchStatistics {
            requested: unique.len(),
            ..Default::default()
        };
        let mut results = HashMap::new();

        if unique.is_empty() {
            return (results, stats);
        }

        let chunk_size = self.config.chunk_size.max(1);
        let chunks: VecDeque<Vec<String>> = unique
            .chunks(chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        let total_chunks = chunks.len();
        let workers = self.config.worker_count(total_chunks);
        let limit = self.config.max_concurrent_requests.max(1);

        tracing::info!(
            "Fetching {} pages in {} chunks with {} workers ({} concurrent requests each)",
            unique.len(),
            total_chunks,
            workers,
            limit
        );

        let queue: ChunkQueue = Arc::new(Mutex::new(chunks));
        let (tx, mut rx) = mpsc::unbounded_channel::<ChunkOutcome>();

        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let factory = Arc::clone(&self.factory);
            let runner = Arc::clone(&self.runner);
            let tx = tx.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("atlas-fetch-{}", worker_id))
                .spawn(move || run_worker(worker_id, queue, factory, runner, limit, tx));

            if let Err(e) = spawned {
                tracing::error!("Failed to spawn fetch worker {}: {}", worker_id, e);
            }
        }
        drop(tx);

        let mut processed = 0usize;
        let mut chunks_done = 0usize;
        while let Some(outcome) = rx.recv().await {
            chunks_done += 1;
            processed += outcome.requested;
            if outcome.crashed {
                stats.crashed_chunks += 1;
                tracing::warn!(
                    "Worker {} crashed; {} pages in its chunk count as failed",
                    outcome.worker_id,
                    outcome.requested
                );
            }

            stats.succeeded += outcome.records.len();
            stats.failed += outcome.requested - outcome.records.len();
            for record in outcome.records {
                results.insert(record.url.clone(), record);
            }

            let rate = stats.succeeded as f64 / start.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: {}/{} chunks, {}/{} pages ({} failed), {:.2} pages/sec",
                chunks_done,
                total_chunks,
                processed,
                stats.requested,
                stats.failed,
                rate
            );
        }

        // Chunks nobody picked up (every worker died before reaching them)
        let orphaned: usize = queue
            .lock()
            .map(|mut remaining| remaining.drain(..).map(|chunk| chunk.len()).sum())
            .unwrap_or(0);
        if orphaned > 0 {
            tracing::warn!("{} pages were never fetched: no worker left to take them", orphaned);
            stats.failed += orphaned;
        }
        // Poisoned queue: whatever is unaccounted for failed
        let accounted = stats.succeeded + stats.failed;
        if accounted < stats.requested {
            stats.failed += stats.requested - accounted;
        }

        stats.elapsed = start.elapsed();
        tracing::info!(
            "Content fetch complete: {} of {} pages in {:.2?} ({:.2} pages/sec, {} failed)",
            stats.succeeded,
            stats.requested,
            stats.elapsed,
            stats.pages_per_second(),
            stats.failed
        );

        (results, stats)
    }
}

fn dedupe(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

fn next_chunk(queue: &ChunkQueue) -> Option<Vec<String>> {
    queue.lock().ok()?.pop_front()
}

fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Creates a worker's page source and runtime
fn start_worker(worker_id: usize, factory: &SourceFactory) -> Option<(Arc<dyn PageSource>, Runtime)> {
    let source = match factory() {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Worker {} could not create a page source: {}", worker_id, e);
            return None;
        }
    };

    match build_runtime() {
        Ok(runtime) => Some((source, runtime)),
        Err(e) => {
            tracing::error!("Worker {} could not start a runtime: {}", worker_id, e);
            None
        }
    }
}

fn run_worker(
    worker_id: usize,
    queue: ChunkQueue,
    factory: SourceFactory,
    runner: ChunkRunner,
    limit: usize,
    tx: mpsc::UnboundedSender<ChunkOutcome>,
) {
    let Some((mut source, mut runtime)) = start_worker(worker_id, &factory) else {
        return;
    };

    while let Some(chunk) = next_chunk(&queue) {
        let requested = chunk.len();
        tracing::debug!("Worker {} took a chunk of {} pages", worker_id, requested);

        let processed = std::panic::catch_unwind(AssertUnwindSafe(|| {
            runner(&runtime, Arc::clone(&source), chunk, limit)
        }));
        let crashed = processed.is_err();

        let outcome = ChunkOutcome {
            worker_id,
            requested,
            records: processed.unwrap_or_default(),
            crashed,
        };
        if tx.send(outcome).is_err() {
            break;
        }

        if crashed {
            // Source and runtime may both be left mid-request; start over with fresh ones
            tracing::debug!("Worker {} rebuilding its page source and runtime", worker_id);
            match start_worker(worker_id, &factory) {
                Some((fresh_source, fresh_runtime)) => {
                    source = fresh_source;
                    runtime = fresh_runtime;
                }
                None => return,
            }
        }
    }
}

fn run_chunk(
    runtime: &Runtime,
    source: Arc<dyn PageSource>,
    chunk: Vec<String>,
    limit: usize,
) -> Vec<ContentRecord> {
    runtime.block_on(process_chunk(source, chunk, limit))
}

async fn process_chunk(
    source: Arc<dyn PageSource>,
    chunk: Vec<String>,
    limit: usize,
) -> Vec<ContentRecord> {
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks = JoinSet::new();

    for url in chunk {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            fetch_one(source.as_ref(), url).await
        });
    }

    let mut records = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => tracing::warn!("Fetch task failed: {}", e),
        }
    }
    records
}

async fn fetch_one(source: &dyn PageSource, url: String) -> Option<ContentRecord> {
    match source.fetch_html(&url).await {
        FetchResult::Success { body, .. } => {
            let Some(content) = extract_readable_content(&body) else {
                tracing::debug!("No readable content in {}", url);
                return None;
            };
            let title = content.title.unwrap_or_else(|| url.clone());
            Some(ContentRecord {
                url,
                title,
                body: content.body,
            })
        }
        FetchResult::HttpError { status_code } => {
            tracing::debug!("HTTP {} for {}", status_code, url);
            None
        }
        FetchResult::EmptyBody => {
            tracing::debug!("Empty body for {}", url);
            None
        }
        FetchResult::NetworkError { error } => {
            tracing::debug!("Network error for {}: {}", url, error);
            None
        }
    }
}
