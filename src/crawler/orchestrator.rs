//! Crawl orchestrator - main crawl loop
//!
//! One orchestrator loop runs per crawl session. It owns the session's
//! [`CrawlGraph`], dispatches a retrieve task per node, waits for any of them
//! to finish, and turns every state change into a stream event:
//! - The seed becomes the root node and is dispatched immediately
//! - A rendered node at depth below the limit has its links admitted as children
//! - Completions are handled one at a time, so dedup never races
//! - A dropped event receiver stops further dispatching

use crate::article::ParsedArticle;
use crate::config::CrawlerConfig;
use crate::crawler::retrieve::{retrieve, RetrieveContext};
use crate::fetch::ArticleFetcher;
use crate::graph::{Admission, ArticleNode, CrawlGraph};
use crate::store::ArticleStore;
use crate::stream::{EventEmitter, StreamEvent};
use crate::url::{normalize_url, resolve_relative, HostBlacklist};
use crate::{ArticlesaError, FetchError, FetchResult, Result};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle};

/// A request to crawl outward from one seed article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub seed_url: String,
    /// Only nodes shallower than this are expanded
    pub max_depth: u32,
}

impl CrawlRequest {
    pub fn new(seed_url: impl Into<String>, max_depth: u32) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_depth,
        }
    }
}

/// Resource limits of a crawl session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Independent timeout of each node's retrieve step
    pub fetch_timeout: Duration,
    /// Size of the fetch worker pool
    pub max_concurrent_fetches: usize,
    /// Capacity of the event channel
    pub event_buffer: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for CrawlSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            max_concurrent_fetches: config.max_concurrent_fetches as usize,
            event_buffer: config.event_buffer as usize,
        }
    }
}

/// Final state of a crawl session
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub graph: CrawlGraph,
    /// True if the client disconnected before the crawl finished
    pub cancelled: bool,
}

/// A running crawl: its event stream and the task driving it
#[derive(Debug)]
pub struct CrawlSession {
    pub events: mpsc::Receiver<StreamEvent>,
    pub handle: JoinHandle<CrawlOutcome>,
}

impl CrawlSession {
    /// Drains every event, then waits for the crawl task
    pub async fn collect(mut self) -> std::result::Result<(Vec<StreamEvent>, CrawlOutcome), JoinError> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let outcome = self.handle.await?;
        Ok((events, outcome))
    }
}

type InFlight = FuturesUnordered<BoxFuture<'static, (String, FetchResult<ParsedArticle>)>>;

/// Drives crawl sessions
#[derive(Clone)]
pub struct Orchestrator {
    context: Arc<RetrieveContext>,
    blacklist: Arc<HostBlacklist>,
    settings: CrawlSettings,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn ArticleFetcher>,
        blacklist: Arc<HostBlacklist>,
        settings: CrawlSettings,
    ) -> Self {
        let context = Arc::new(RetrieveContext {
            fetcher,
            store: None,
            workers: Arc::new(Semaphore::new(settings.max_concurrent_fetches.max(1))),
            fetch_timeout: settings.fetch_timeout,
        });

        Self {
            context,
            blacklist,
            settings,
        }
    }

    /// Uses `store` as the article cache for every later session
    pub fn with_store(self, store: Arc<dyn ArticleStore>) -> Self {
        let context = Arc::new(RetrieveContext {
            fetcher: self.context.fetcher.clone(),
            store: Some(store),
            workers: self.context.workers.clone(),
            fetch_timeout: self.context.fetch_timeout,
        });

        Self { context, ..self }
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Starts a crawl on a new task
    ///
    /// The seed is checked before anything is spawned, so an unusable seed
    /// is reported here and no event is ever sent.
    pub fn start(&self, request: CrawlRequest) -> Result<CrawlSession> {
        let seed = self.accept_seed(&request.seed_url)?;
        let (emitter, events) = EventEmitter::channel(self.settings.event_buffer);

        let orchestrator = self.clone();
        let handle = tokio::spawn(async move {
            orchestrator
                .drive(seed, request.max_depth, emitter)
                .await
        });

        Ok(CrawlSession { events, handle })
    }

    /// Runs a crawl to completion on the current task
    pub async fn run(&self, request: CrawlRequest, emitter: EventEmitter) -> Result<CrawlOutcome> {
        let seed = self.accept_seed(&request.seed_url)?;
        Ok(self.drive(seed, request.max_depth, emitter).await)
    }

    /// Normalizes the seed and rejects blacklisted hosts
    fn accept_seed(&self, seed_url: &str) -> Result<String> {
        let seed = normalize_url(seed_url)?;
        if self.blacklist.is_url_blocked(&seed) {
            return Err(ArticlesaError::BlockedSeed { url: seed });
        }
        Ok(seed)
    }

    async fn drive(&self, seed: String, max_depth: u32, mut emitter: EventEmitter) -> CrawlOutcome {
        let start_time = Instant::now();
        tracing::info!("Starting crawl of {} (max depth {})", seed, max_depth);

        let mut graph = CrawlGraph::new(&seed);
        let mut in_flight = InFlight::new();

        emitter.emit(StreamEvent::begin()).await;
        self.dispatch(&mut in_flight, graph.root(), None);
        emitter.emit(StreamEvent::processing(graph.root())).await;

        let mut cancelled = false;
        loop {
            let next = tokio::select! {
                biased;
                _ = emitter.closed() => None,
                next = in_flight.next() => Some(next),
            };

            let Some(next) = next else {
                cancelled = true;
                break;
            };
            let Some((hash, result)) = next else {
                break;
            };

            let handled = match result {
                Ok(article) => {
                    self.handle_rendered(&mut graph, &mut emitter, &mut in_flight, &hash, article, max_depth)
                        .await
                }
                Err(error) => Self::handle_failed(&mut graph, &mut emitter, &hash, &error).await,
            };

            if let Err(e) = handled {
                tracing::error!("Failed to record completion of {}: {}", hash, e);
            }
        }

        if cancelled {
            // Dropping the handles detaches the tasks; their results are discarded
            tracing::info!(
                "Client disconnected from crawl of {}; abandoning {} in-flight fetches",
                seed,
                in_flight.len()
            );
        } else {
            emitter.emit(StreamEvent::end()).await;
        }

        let summary = graph.summary();
        tracing::info!(
            "Crawl of {} finished in {:?}: {} nodes ({} rendered, {} failed, {} unresolved), {} edges, deepest depth {}",
            seed,
            start_time.elapsed(),
            summary.nodes,
            summary.rendered,
            summary.failed,
            summary.processing,
            summary.edges,
            summary.max_depth_reached
        );

        CrawlOutcome { graph, cancelled }
    }

    /// Spawns the retrieve task for `node`
    fn dispatch(&self, in_flight: &mut InFlight, node: &ArticleNode, parent_url: Option<String>) {
        let hash = node.url_hash.clone();
        let url = node.url.clone();
        tracing::debug!("Dispatching {} at depth {}", url, node.depth);

        let handle = tokio::spawn(retrieve(self.context.clone(), url.clone(), parent_url));
        in_flight.push(
            async move {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(FetchError::Aborted {
                        url,
                        message: e.to_string(),
                    }),
                };
                (hash, result)
            }
            .boxed(),
        );
    }

    async fn handle_rendered(
        &self,
        graph: &mut CrawlGraph,
        emitter: &mut EventEmitter,
        in_flight: &mut InFlight,
        hash: &str,
        mut article: ParsedArticle,
        max_depth: u32,
    ) -> Result<()> {
        // Only canonical, allowed links are recorded on the node or sent out
        let mut seen = HashSet::new();
        article.links = article
            .links
            .iter()
            .filter_map(|link| self.child_url(link, &article.url))
            .filter(|link| seen.insert(link.clone()))
            .collect();

        let node = graph.mark_rendered(hash, &article)?;
        let depth = node.depth;
        let parent_url = node.url.clone();
        tracing::debug!("Rendered {} at depth {}", node.url, depth);
        emitter.emit(StreamEvent::render(node)).await;

        if depth >= max_depth {
            return Ok(());
        }

        for child_url in &article.links {
            if emitter.is_closed() {
                break;
            }

            match graph.admit_child(hash, child_url)? {
                Admission::Created(child_hash) => {
                    let child = graph
                        .get(&child_hash)
                        .ok_or_else(|| ArticlesaError::UnknownNode(child_hash.clone()))?;
                    self.dispatch(in_flight, child, Some(parent_url.clone()));
                    emitter.emit(StreamEvent::processing(child)).await;
                }
                Admission::Linked(_) => {
                    tracing::trace!("{} already in graph; edge added", child_url);
                }
                Admission::Duplicate(_) | Admission::SelfLink => {
                    tracing::trace!("Ignoring repeated link {}", child_url);
                }
            }
        }

        Ok(())
    }

    async fn handle_failed(
        graph: &mut CrawlGraph,
        emitter: &mut EventEmitter,
        hash: &str,
        error: &FetchError,
    ) -> Result<()> {
        let node = graph.mark_failed(hash, error.to_string())?;
        tracing::warn!("Failed to retrieve {}: {}", node.url, error);
        emitter.emit(StreamEvent::failure(hash, error)).await;
        Ok(())
    }

    /// Canonical form of a link found in an article served from `base_url`
    ///
    /// Returns `None` for links that cannot be resolved or whose host is
    /// blacklisted.
    fn child_url(&self, link: &str, base_url: &str) -> Option<String> {
        let resolved = if link.starts_with('/') {
            resolve_relative(link, base_url)
        } else {
            normalize_url(link)
        };

        match resolved {
            Ok(url) if self.blacklist.is_url_blocked(&url) => {
                tracing::trace!("Dropping blacklisted link {}", url);
                None
            }
            Ok(url) => Some(url),
            Err(e) => {
                tracing::debug!("Dropping link {}: {}", link, e);
                None
            }
        }
    }
}
