//! Integration tests for the crawl orchestrator
//!
//! These tests drive whole crawl sessions against an in-memory fetcher so
//! that graph shape, event order, store use, timeouts and cancellation can
//! be checked without a network.

use articlesa::article::ParsedArticle;
use articlesa::crawler::{CrawlOutcome, CrawlRequest, CrawlSettings, Orchestrator};
use articlesa::fetch::ArticleFetcher;
use articlesa::state::NodeState;
use articlesa::store::{ArticleStore, SqliteArticleStore, StoreError, StoreResult, StoreStats};
use articlesa::stream::{EventKind, StreamEvent};
use articlesa::url::{url_hash, HostBlacklist};
use articlesa::{ArticlesaError, FetchError, FetchResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned fetch results keyed by requested URL
///
/// URLs without an entry fail with HTTP 404.
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, (Duration, FetchResult<ParsedArticle>)>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubFetcher {
    fn new() -> Self {
        Self::default()
    }

    /// Serves an article at `url` with the given outbound links
    fn article(self, url: &str, title: &str, links: &[&str]) -> Self {
        self.served_from(url, url, title, links)
    }

    /// Serves an article requested as `url` from `final_url`
    fn served_from(mut self, url: &str, final_url: &str, title: &str, links: &[&str]) -> Self {
        let article = ParsedArticle::new(final_url, title, format!("{} body", title))
            .with_links(links.iter().copied());
        self.pages
            .insert(url.to_string(), (Duration::ZERO, Ok(article)));
        self
    }

    fn failure(mut self, url: &str, error: FetchError) -> Self {
        self.pages
            .insert(url.to_string(), (Duration::ZERO, Err(error)));
        self
    }

    fn delayed(mut self, url: &str, delay: Duration) -> Self {
        if let Some(entry) = self.pages.get_mut(url) {
            entry.0 = delay;
        }
        self
    }

    fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ArticleFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<ParsedArticle> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert(0) += 1;

        match self.pages.get(url) {
            Some((delay, result)) => {
                tokio::time::sleep(*delay).await;
                result.clone()
            }
            None => Err(FetchError::RedirectResolutionFailed {
                url: url.to_string(),
                status: Some(404),
            }),
        }
    }
}

/// A store that is never reachable
struct BrokenStore;

impl ArticleStore for BrokenStore {
    fn get(&self, _canonical_url: &str) -> StoreResult<Option<ParsedArticle>> {
        Err(StoreError::Unavailable("down".to_string()))
    }

    fn put(
        &self,
        _canonical_url: &str,
        _article: &ParsedArticle,
        _parent_url: Option<&str>,
    ) -> StoreResult<()> {
        Err(StoreError::Unavailable("down".to_string()))
    }

    fn citing_urls(&self, _canonical_url: &str) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("down".to_string()))
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        Err(StoreError::Unavailable("down".to_string()))
    }
}

fn settings() -> CrawlSettings {
    CrawlSettings {
        fetch_timeout: Duration::from_secs(5),
        max_concurrent_fetches: 4,
        event_buffer: 16,
    }
}

fn orchestrator(fetcher: &Arc<StubFetcher>, blacklist: HostBlacklist) -> Orchestrator {
    Orchestrator::new(fetcher.clone(), Arc::new(blacklist), settings())
}

/// Runs a crawl to completion and returns its events and outcome
async fn crawl(orchestrator: &Orchestrator, seed: &str, max_depth: u32) -> (Vec<StreamEvent>, CrawlOutcome) {
    let session = orchestrator
        .start(CrawlRequest::new(seed, max_depth))
        .expect("seed should be accepted");

    tokio::time::timeout(Duration::from_secs(10), session.collect())
        .await
        .expect("crawl should finish")
        .expect("crawl task should not panic")
}

fn kinds(events: &[StreamEvent]) -> Vec<EventKind> {
    events.iter().map(|e| e.event).collect()
}

fn position(events: &[StreamEvent], kind: EventKind, id: &str) -> usize {
    events
        .iter()
        .position(|e| e.event == kind && e.id == id)
        .unwrap_or_else(|| panic!("no {} event for {}", kind, id))
}

fn node_state(outcome: &CrawlOutcome, url: &str) -> NodeState {
    outcome
        .graph
        .get_by_url(url)
        .unwrap_or_else(|| panic!("no node for {}", url))
        .state
}

#[tokio::test]
async fn test_seed_with_failing_and_relative_children() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article("https://a.example/x", "A", &["https://b.example/1", "/local"])
            .failure(
                "https://b.example/1",
                FetchError::RedirectResolutionFailed {
                    url: "https://b.example/1".to_string(),
                    status: Some(500),
                },
            )
            .article("https://a.example/local", "Local", &[]),
    );
    let orch = orchestrator(&fetcher, HostBlacklist::new());

    let (events, outcome) = crawl(&orch, "https://a.example/x?y=1#z", 1).await;

    let a = url_hash("https://a.example/x");
    let b = url_hash("https://b.example/1");
    let local = url_hash("https://a.example/local");

    assert_eq!(events.len(), 8);
    assert_eq!(events[0].event, EventKind::StreamBegin);
    assert_eq!((events[1].event, events[1].id.as_str()), (EventKind::NodeProcessing, a.as_str()));
    assert_eq!((events[2].event, events[2].id.as_str()), (EventKind::NodeRender, a.as_str()));
    assert_eq!(events[7].event, EventKind::StreamEnd);

    let children: HashSet<&str> = events[3..5]
        .iter()
        .filter(|e| e.event == EventKind::NodeProcessing)
        .map(|e| e.id.as_str())
        .collect();
    assert_eq!(children, HashSet::from([b.as_str(), local.as_str()]));

    let failure = &events[position(&events, EventKind::NodeFailure, &b)];
    assert_eq!(failure.data_json()["statusCode"], 500);
    position(&events, EventKind::NodeRender, &local);

    assert!(!outcome.cancelled);
    assert_eq!(outcome.graph.node_count(), 3);
    assert_eq!(outcome.graph.edge_count(), 2);
    assert_eq!(node_state(&outcome, "https://b.example/1"), NodeState::Failed);
    assert_eq!(node_state(&outcome, "https://a.example/local"), NodeState::Rendered);
    for url in ["https://b.example/1", "https://a.example/local"] {
        assert_eq!(outcome.graph.get_by_url(url).unwrap().depth, 1);
    }
}

#[tokio::test]
async fn test_blacklisted_links_never_become_nodes() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article(
                "https://a.example/x",
                "A",
                &["https://evil.com/a", "https://news.evil.com/b", "https://b.example/1"],
            )
            .article("https://b.example/1", "B", &[]),
    );
    let orch = orchestrator(&fetcher, HostBlacklist::from_entries(["evil.com"]));

    let (events, outcome) = crawl(&orch, "https://a.example/x", 2).await;

    assert_eq!(outcome.graph.node_count(), 2);
    assert_eq!(fetcher.calls("https://evil.com/a"), 0);
    assert_eq!(fetcher.calls("https://news.evil.com/b"), 0);

    for event in &events {
        assert!(!event.data.contains("evil.com"), "leaked in {:?}", event);
    }
    assert!(events
        .iter()
        .all(|e| e.id != url_hash("https://evil.com/a")));

    let root = outcome.graph.root();
    assert_eq!(root.outbound_links, vec!["https://b.example/1".to_string()]);
}

#[tokio::test]
async fn test_blacklisted_seed_is_fatal() {
    let fetcher = Arc::new(StubFetcher::new());
    let orch = orchestrator(&fetcher, HostBlacklist::from_entries(["evil.com"]));

    let err = orch
        .start(CrawlRequest::new("https://www.evil.com/post", 1))
        .unwrap_err();
    assert!(matches!(err, ArticlesaError::BlockedSeed { .. }));

    let err = orch
        .start(CrawlRequest::new("not a url", 1))
        .unwrap_err();
    assert!(matches!(err, ArticlesaError::UrlError(_)));
    assert_eq!(fetcher.calls("https://www.evil.com/post"), 0);
}

#[tokio::test]
async fn test_max_depth_zero_fetches_only_the_root() {
    let fetcher = Arc::new(StubFetcher::new().article(
        "https://a.example/x",
        "A",
        &["https://b.example/1", "https://c.example/2", "/local"],
    ));
    let orch = orchestrator(&fetcher, HostBlacklist::new());

    let (events, outcome) = crawl(&orch, "https://a.example/x", 0).await;

    assert_eq!(
        kinds(&events),
        vec![
            EventKind::StreamBegin,
            EventKind::NodeProcessing,
            EventKind::NodeRender,
            EventKind::StreamEnd
        ]
    );
    assert_eq!(outcome.graph.node_count(), 1);
    assert_eq!(outcome.graph.edge_count(), 0);
    assert_eq!(fetcher.calls("https://b.example/1"), 0);
}

#[tokio::test]
async fn test_max_depth_zero_with_failing_root() {
    let fetcher = Arc::new(StubFetcher::new());
    let orch = orchestrator(&fetcher, HostBlacklist::new());

    let (events, outcome) = crawl(&orch, "https://a.example/missing", 0).await;

    assert_eq!(
        kinds(&events),
        vec![
            EventKind::StreamBegin,
            EventKind::NodeProcessing,
            EventKind::NodeFailure,
            EventKind::StreamEnd
        ]
    );
    assert_eq!(outcome.graph.root().state, NodeState::Failed);
    assert!(outcome.graph.root().failure_reason.is_some());
}

#[tokio::test]
async fn test_shared_children_are_deduplicated() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article(
                "https://a.example/x",
                "A",
                &["https://b.example/1", "https://c.example/2", "https://b.example/1?again"],
            )
            .article("https://b.example/1", "B", &["https://d.example/shared"])
            .article("https://c.example/2", "C", &["https://d.example/shared#frag"])
            .article("https://d.example/shared", "D", &["https://a.example/x"]),
    );
    let orch = orchestrator(&fetcher, HostBlacklist::new());

    let (events, outcome) = crawl(&orch, "https://a.example/x", 3).await;

    assert_eq!(outcome.graph.node_count(), 4);
    // A->B, A->C, B->D, C->D, D->A
    assert_eq!(outcome.graph.edge_count(), 5);
    assert_eq!(fetcher.calls("https://d.example/shared"), 1);
    assert_eq!(fetcher.calls("https://a.example/x"), 1);

    let d = url_hash("https://d.example/shared");
    assert_eq!(outcome.graph.parents_of(&d).len(), 2);
    assert_eq!(outcome.graph.get(&d).unwrap().depth, 2);

    let processing = events
        .iter()
        .filter(|e| e.event == EventKind::NodeProcessing)
        .count();
    assert_eq!(processing, 4);

    // Node keys and canonical URLs are one-to-one
    let urls: HashSet<&str> = outcome.graph.nodes().map(|n| n.url.as_str()).collect();
    assert_eq!(urls.len(), outcome.graph.node_count());
}

#[tokio::test]
async fn test_depth_bound_and_event_order() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article("https://a.example/0", "Root", &["https://a.example/1a", "https://a.example/1b"])
            .article("https://a.example/1a", "1a", &["https://a.example/2a"])
            .article("https://a.example/1b", "1b", &["https://a.example/2b"])
            .article("https://a.example/2a", "2a", &["https://a.example/3a"])
            .article("https://a.example/2b", "2b", &["https://a.example/3b"])
            .article("https://a.example/3a", "3a", &[])
            .delayed("https://a.example/1b", Duration::from_millis(30)),
    );
    let orch = orchestrator(&fetcher, HostBlacklist::new());

    let (events, outcome) = crawl(&orch, "https://a.example/0", 2).await;

    assert_eq!(outcome.graph.node_count(), 5);
    assert!(outcome.graph.is_complete(2));
    for node in outcome.graph.nodes() {
        assert!(node.depth <= 2);
        if node.depth == 2 {
            assert!(outcome.graph.children_of(&node.url_hash).is_empty());
        }
    }
    assert_eq!(fetcher.calls("https://a.example/3a"), 0);

    for node in outcome.graph.nodes() {
        let processing = position(&events, EventKind::NodeProcessing, &node.url_hash);
        let render = position(&events, EventKind::NodeRender, &node.url_hash);
        assert!(processing < render);

        if let Some(parent) = &node.parent_hash {
            assert!(position(&events, EventKind::NodeRender, parent) < processing);
            assert_eq!(
                events[processing].data_json()["parentHash"],
                parent.as_str()
            );
        }
    }
}

#[tokio::test]
async fn test_store_hit_skips_fetch() {
    let fetcher = Arc::new(StubFetcher::new().article("https://b.example/1", "B", &[]));
    let store = Arc::new(SqliteArticleStore::open_in_memory().unwrap());
    store
        .put(
            "https://a.example/x",
            &ParsedArticle::new("https://a.example/x", "Cached A", "cached")
                .with_links(["https://b.example/1"]),
            None,
        )
        .unwrap();

    let orch = orchestrator(&fetcher, HostBlacklist::new()).with_store(store.clone());
    let (_, outcome) = crawl(&orch, "https://a.example/x", 1).await;

    assert_eq!(fetcher.calls("https://a.example/x"), 0);
    assert_eq!(fetcher.calls("https://b.example/1"), 1);
    assert_eq!(outcome.graph.root().title.as_deref(), Some("Cached A"));

    // The freshly fetched child was written back with its citation
    assert!(store.get("https://b.example/1").unwrap().is_some());
    assert_eq!(
        store.citing_urls("https://b.example/1").unwrap(),
        vec!["https://a.example/x".to_string()]
    );
}

#[tokio::test]
async fn test_redirected_seed_is_served_from_store_on_second_crawl() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .served_from("https://short.example/s", "https://long.example/post", "Post", &[]),
    );
    let store = Arc::new(SqliteArticleStore::open_in_memory().unwrap());
    let orch = orchestrator(&fetcher, HostBlacklist::new()).with_store(store.clone());

    let (_, first) = crawl(&orch, "https://short.example/s", 1).await;
    let (events, second) = crawl(&orch, "https://short.example/s", 1).await;

    assert_eq!(fetcher.calls("https://short.example/s"), 1);
    assert_eq!(first.graph.root().state, NodeState::Rendered);
    assert_eq!(
        second.graph.root().resolved_url.as_deref(),
        Some("https://long.example/post")
    );
    let render = &events[position(&events, EventKind::NodeRender, &url_hash("https://short.example/s"))];
    assert_eq!(render.data_json()["url"], "https://long.example/post");
}

#[tokio::test]
async fn test_citation_recorded_against_parent_node_url() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .served_from("https://short.example/s", "https://long.example/post", "Post", &["https://b.example/1"])
            .article("https://b.example/1", "B", &[]),
    );
    let store = Arc::new(SqliteArticleStore::open_in_memory().unwrap());
    let orch = orchestrator(&fetcher, HostBlacklist::new()).with_store(store.clone());

    crawl(&orch, "https://short.example/s", 1).await;

    assert_eq!(
        store.citing_urls("https://b.example/1").unwrap(),
        vec!["https://short.example/s".to_string()]
    );
}

#[tokio::test]
async fn test_unavailable_store_does_not_fail_nodes() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article("https://a.example/x", "A", &["https://b.example/1"])
            .article("https://b.example/1", "B", &[]),
    );
    let orch = orchestrator(&fetcher, HostBlacklist::new()).with_store(Arc::new(BrokenStore));

    let (events, outcome) = crawl(&orch, "https://a.example/x", 1).await;

    assert_eq!(outcome.graph.summary().rendered, 2);
    assert!(events.iter().all(|e| e.event != EventKind::NodeFailure));
    assert_eq!(fetcher.calls("https://a.example/x"), 1);
}

#[tokio::test]
async fn test_slow_fetch_times_out_without_blocking_siblings() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article("https://a.example/x", "A", &["https://slow.example/", "https://b.example/1"])
            .article("https://slow.example/", "Slow", &[])
            .delayed("https://slow.example/", Duration::from_secs(30))
            .article("https://b.example/1", "B", &[]),
    );
    let settings = CrawlSettings {
        fetch_timeout: Duration::from_millis(200),
        ..settings()
    };
    let orch = Orchestrator::new(fetcher.clone(), Arc::new(HostBlacklist::new()), settings);

    let (events, outcome) = crawl(&orch, "https://a.example/x", 1).await;

    assert_eq!(node_state(&outcome, "https://slow.example/"), NodeState::Failed);
    assert_eq!(node_state(&outcome, "https://b.example/1"), NodeState::Rendered);

    let slow = url_hash("https://slow.example/");
    let failure = &events[position(&events, EventKind::NodeFailure, &slow)];
    let message = failure.data_json()["message"].as_str().unwrap().to_string();
    assert!(message.contains("timed out"));
    assert!(failure.data_json().get("statusCode").is_none());
}

#[tokio::test]
async fn test_queued_fetches_do_not_time_out_waiting_for_a_worker() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article(
                "https://a.example/x",
                "A",
                &["https://b.example/1", "https://c.example/2", "https://d.example/3"],
            )
            .article("https://b.example/1", "B", &[])
            .delayed("https://b.example/1", Duration::from_millis(60))
            .article("https://c.example/2", "C", &[])
            .delayed("https://c.example/2", Duration::from_millis(60))
            .article("https://d.example/3", "D", &[])
            .delayed("https://d.example/3", Duration::from_millis(60)),
    );
    let settings = CrawlSettings {
        fetch_timeout: Duration::from_millis(100),
        max_concurrent_fetches: 1,
        ..settings()
    };
    let orch = Orchestrator::new(fetcher.clone(), Arc::new(HostBlacklist::new()), settings);

    let (events, outcome) = crawl(&orch, "https://a.example/x", 1).await;

    assert_eq!(outcome.graph.summary().rendered, 4);
    assert!(events.iter().all(|e| e.event != EventKind::NodeFailure));
    for url in ["https://b.example/1", "https://c.example/2", "https://d.example/3"] {
        assert_eq!(node_state(&outcome, url), NodeState::Rendered);
        assert_eq!(fetcher.calls(url), 1);
    }
}

#[tokio::test]
async fn test_redirected_article_keeps_identity() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .served_from("https://short.example/s", "https://long.example/post", "Post", &["/cited"])
            .article("https://long.example/cited", "Cited", &[]),
    );
    let orch = orchestrator(&fetcher, HostBlacklist::new());

    let (events, outcome) = crawl(&orch, "https://short.example/s", 1).await;

    let root = outcome.graph.root();
    assert_eq!(root.url, "https://short.example/s");
    assert_eq!(root.url_hash, url_hash("https://short.example/s"));
    assert_eq!(root.resolved_url.as_deref(), Some("https://long.example/post"));

    let render = &events[position(&events, EventKind::NodeRender, &root.url_hash)];
    assert_eq!(render.data_json()["url"], "https://long.example/post");

    // Relative links resolve against where the article was served from
    assert_eq!(node_state(&outcome, "https://long.example/cited"), NodeState::Rendered);
}

#[tokio::test]
async fn test_client_disconnect_cancels_crawl() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .article("https://a.example/x", "A", &["https://b.example/1", "https://c.example/2"])
            .article("https://b.example/1", "B", &["https://d.example/3"])
            .delayed("https://b.example/1", Duration::from_secs(30))
            .article("https://c.example/2", "C", &[])
            .delayed("https://c.example/2", Duration::from_secs(30)),
    );
    let settings = CrawlSettings {
        fetch_timeout: Duration::from_secs(60),
        ..settings()
    };
    let orch = Orchestrator::new(fetcher.clone(), Arc::new(HostBlacklist::new()), settings);

    let mut session = orch
        .start(CrawlRequest::new("https://a.example/x", 3))
        .unwrap();

    // Read until the root has rendered, then walk away
    loop {
        let event = session.events.recv().await.expect("stream ended early");
        if event.event == EventKind::NodeRender {
            break;
        }
    }
    drop(session.events);

    let outcome = tokio::time::timeout(Duration::from_secs(5), session.handle)
        .await
        .expect("crawl should stop promptly")
        .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.graph.root().state, NodeState::Rendered);
    assert_eq!(fetcher.calls("https://d.example/3"), 0);
    assert!(!outcome.graph.nodes_in_progress().is_empty());
}
