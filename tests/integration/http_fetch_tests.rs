//! Integration tests for the HTTP article fetcher
//!
//! These tests use wiremock to create mock HTTP servers and test
//! redirect resolution, extraction, link filtering, and a full crawl
//! end-to-end.

use articlesa::config::Config;
use articlesa::crawler::{CrawlRequest, CrawlSettings, Orchestrator};
use articlesa::fetch::HttpArticleFetcher;
use articlesa::state::NodeState;
use articlesa::stream::EventKind;
use articlesa::url::HostBlacklist;
use articlesa::FetchError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn article_html(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!(
        r#"<html><head><title>{title}</title>
<meta name="author" content="Test Author">
<meta property="article:published_time" content="2024-02-03T04:05:06Z">
</head><body><article><h1>{title}</h1><p>Body of {title}.</p>{anchors}</article></body></html>"#
    )
}

/// Mounts a page answering both the HEAD probe and the GET
async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

fn fetcher(blacklist: HostBlacklist) -> HttpArticleFetcher {
    HttpArticleFetcher::new(&Config::default(), Arc::new(blacklist))
        .expect("Failed to build fetcher")
}

#[tokio::test]
async fn test_fetch_article_fields_and_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/article",
        article_html(
            "Main",
            &["/cited", "/cited?utm=feed", "/missing", "https://blocked.test/x", "relative"],
        ),
    )
    .await;
    mount_page(&server, "/cited", article_html("Cited", &[])).await;

    let article = fetcher(HostBlacklist::from_entries(["blocked.test"]))
        .fetch_article(&format!("{}/article", base))
        .await
        .unwrap();

    assert_eq!(article.url, format!("{}/article", base));
    assert_eq!(article.title, "Main");
    assert_eq!(article.text, "Body of Main.");
    assert_eq!(article.authors, vec!["Test Author".to_string()]);
    assert_eq!(article.published.as_deref(), Some("2024-02-03T04:05:06Z"));
    // /missing fails its probe, the blocked host and bare relative path are dropped
    assert_eq!(article.links, vec![format!("{}/cited", base)]);
}

#[tokio::test]
async fn test_fetch_follows_redirect() {
    let server = MockServer::start().await;
    let base = server.uri();

    for verb in ["HEAD", "GET"] {
        Mock::given(method(verb))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", base).as_str()),
            )
            .mount(&server)
            .await;
    }
    mount_page(&server, "/new", article_html("Moved", &[])).await;

    let article = fetcher(HostBlacklist::new())
        .fetch_article(&format!("{}/old", base))
        .await
        .unwrap();

    assert_eq!(article.url, format!("{}/new", base));
    assert_eq!(article.title, "Moved");
}

#[tokio::test]
async fn test_error_status_fails_article() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = fetcher(HostBlacklist::new())
        .fetch_article(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FetchError::RedirectResolutionFailed {
            status: Some(404),
            ..
        }
    ));
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_page_without_text_fails_extraction() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/empty",
        "<html><head><title>Empty</title></head><body><div>menu</div></body></html>".to_string(),
    )
    .await;

    let err = fetcher(HostBlacklist::new())
        .fetch_article(&format!("{}/empty", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::ContentExtractionFailed { .. }));
}

#[tokio::test]
async fn test_link_redirecting_to_blacklisted_host_is_dropped() {
    let server = MockServer::start().await;
    let port = server.address().port();
    let via_localhost = format!("http://localhost:{}", port);

    // The article links through "localhost"; /out lands on 127.0.0.1
    mount_page(
        &server,
        "/article",
        article_html(
            "Main",
            &[
                &format!("{}/out", via_localhost),
                &format!("{}/stay", via_localhost),
            ],
        ),
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/out"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("http://127.0.0.1:{}/landing", port).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/landing", article_html("Landing", &[])).await;
    mount_page(&server, "/stay", article_html("Stay", &[])).await;

    let article = fetcher(HostBlacklist::from_entries(["127.0.0.1"]))
        .fetch_article(&format!("{}/article", server.uri()))
        .await
        .unwrap();

    assert_eq!(article.links, vec![format!("{}/stay", via_localhost)]);
}

#[tokio::test]
async fn test_crawl_against_mock_server() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/a", article_html("A", &["/b", "/c"])).await;
    mount_page(&server, "/b", article_html("B", &["/a"])).await;

    // /c passes its probe but the page itself errors
    Mock::given(method("HEAD"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = Arc::new(fetcher(HostBlacklist::new()));
    let orchestrator = Orchestrator::new(
        fetcher,
        Arc::new(HostBlacklist::new()),
        CrawlSettings {
            fetch_timeout: Duration::from_secs(10),
            max_concurrent_fetches: 2,
            event_buffer: 8,
        },
    );

    let session = orchestrator
        .start(CrawlRequest::new(format!("{}/a", base), 2))
        .unwrap();
    let (events, outcome) = tokio::time::timeout(Duration::from_secs(30), session.collect())
        .await
        .expect("crawl should finish")
        .unwrap();

    let graph = &outcome.graph;
    assert_eq!(graph.node_count(), 3);
    // a->b, a->c, b->a
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.root().state, NodeState::Rendered);
    assert_eq!(
        graph.get_by_url(&format!("{}/b", base)).unwrap().state,
        NodeState::Rendered
    );

    let c = graph.get_by_url(&format!("{}/c", base)).unwrap();
    assert_eq!(c.state, NodeState::Failed);
    let failure = events
        .iter()
        .find(|e| e.event == EventKind::NodeFailure)
        .expect("failure event");
    assert_eq!(failure.id, c.url_hash);
    assert_eq!(failure.data_json()["statusCode"], 500);

    assert_eq!(events.first().map(|e| e.event), Some(EventKind::StreamBegin));
    assert_eq!(events.last().map(|e| e.event), Some(EventKind::StreamEnd));
}
