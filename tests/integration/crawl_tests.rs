//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small site and run the full crawl
//! cycle end-to-end: root fetch, both trees, content fetch and caching.

use async_trait::async_trait;
use doc_atlas::config::Config;
use doc_atlas::crawler::Coordinator;
use doc_atlas::llm::{CompletionClient, GeminiClient, LlmError};
use doc_atlas::tree::{NodeKind, SemanticCategorizer};
use doc_atlas::CacheLayer;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration caching under the given directory
fn create_test_config(cache_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.cache.directory = cache_dir.path().to_string_lossy().into_owned();
    config.crawler.request_timeout_secs = 5;
    config.crawler.workers = 2;
    config.crawler.chunk_size = 2;
    config.llm.enabled = false;
    config
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body><main>{}</main></body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

/// Mounts a root page linking to three local pages and one external site
async fn mount_site(server: &MockServer, root_hits: u64) {
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            &format!(
                r#"<a href="{base}/docs/intro">Introduction</a>
                <a href="/docs/setup">Setup</a>
                <a href="/blog/post#comments">First post</a>
                <a href="https://elsewhere.example/">Elsewhere</a>
                <a href="mailto:team@example.com">Mail</a>"#
            ),
        ))
        .expect(root_hits)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(html_page("Intro", "<h1>Intro</h1><p>Welcome to the docs.</p>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/setup"))
        .respond_with(html_page("Setup", "<h1>Setup</h1><p>Install the tool.</p>"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(html_page("Post", "<h1>Post</h1><p>News.</p>"))
        .mount(server)
        .await;
}

struct CannedClient {
    reply: String,
}

#[async_trait]
impl CompletionClient for CannedClient {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Ok(self.reply.clone())
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_crawl_then_cache_hit() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    let base = server.uri();

    let cache_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(&cache_dir)).unwrap();

    let report = coordinator.crawl(&base, false).await;
    assert!(report.is_ok(), "crawl failed: {:?}", report.error);
    assert!(!report.from_cache);

    let urls: Vec<&str> = report.bundle.links.iter().map(|l| l.url.as_str()).collect();
    assert!(urls.contains(&format!("{}/docs/intro", base).as_str()));
    assert!(urls.contains(&format!("{}/blog/post", base).as_str()));
    assert!(!urls.iter().any(|u| u.contains("elsewhere")));

    let stats = report.stats.clone().unwrap();
    assert_eq!(stats.requested, report.bundle.conventional_tree.urls().len());
    assert_eq!(stats.requested - stats.failed, report.bundle.pages.len());

    let intro = &report.bundle.pages[&format!("{}/docs/intro", base)];
    assert_eq!(intro.title, "Intro");
    assert!(intro.body.contains("Welcome to the docs."));

    // Without a model the enhanced tree mirrors the structure tree
    assert_eq!(
        report.bundle.enhanced_tree.serialize(),
        report.bundle.conventional_tree.serialize()
    );

    let cache_dir_path = report.cache_dir.clone().unwrap();
    assert!(cache_dir_path.join("manifest.json").is_file());
    assert!(cache_dir_path.join("fasthtml_doc.txt").is_file());

    // The root mock expects exactly one hit, so this must come from disk
    let cached = coordinator.crawl(&base, false).await;
    assert!(cached.from_cache);
    assert!(cached.stats.is_none());
    assert_eq!(cached.bundle, report.bundle);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_recrawls() {
    let server = MockServer::start().await;
    mount_site(&server, 2).await;

    let cache_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(&cache_dir)).unwrap();

    assert!(coordinator.crawl(&server.uri(), false).await.is_ok());
    let refreshed = coordinator.crawl(&server.uri(), true).await;
    assert!(refreshed.is_ok());
    assert!(!refreshed.from_cache);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_pages_are_absent() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/ok">Ok</a><a href="/gone">Gone</a><a href="/broken">Broken</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html_page("Ok", "<p>Fine.</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(&cache_dir)).unwrap();
    let report = coordinator.crawl(&base, false).await;

    assert!(report.is_ok());
    let stats = report.stats.unwrap();
    assert_eq!(stats.requested, 3);
    assert_eq!(stats.succeeded, 1);
    assert_eq!(stats.failed, 2);
    assert_eq!(report.bundle.pages.len(), 1);
    assert!(report.bundle.pages.contains_key(&format!("{}/ok", base)));

    // Failed pages still appear in both trees
    assert_eq!(report.bundle.conventional_tree.urls().len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_max_pages_caps_content_fetch() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let cache_dir = TempDir::new().unwrap();
    let mut config = create_test_config(&cache_dir);
    config.crawler.max_pages = 1;
    let coordinator = Coordinator::new(config).unwrap();

    let report = coordinator.crawl(&server.uri(), false).await;
    assert_eq!(report.stats.as_ref().unwrap().requested, 1);
    assert!(report.bundle.pages.len() <= 1);

    // Links past the cap were never requested, so they get no section at all
    let document =
        std::fs::read_to_string(report.cache_dir.unwrap().join("fasthtml_doc.txt")).unwrap();
    assert_eq!(document.matches("<doc ").count(), 1);
    assert!(!document.contains("Error:"));
    assert!(!document.contains("/docs/setup"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_root_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(&cache_dir)).unwrap();
    let report = coordinator.crawl(&server.uri(), false).await;

    assert!(report.error.unwrap().starts_with("Error fetching content:"));
    assert!(report.bundle.links.is_empty());
    assert!(report.bundle.pages.is_empty());
    assert!(!coordinator.cache().is_cached(&report.domain));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_base_domain_links_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="https://elsewhere.example/a">A</a><a href="javascript:void(0)">B</a>"#,
        ))
        .mount(&server)
        .await;

    let cache_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(&cache_dir)).unwrap();
    let report = coordinator.crawl(&server.uri(), false).await;

    let error = report.error.unwrap();
    assert!(error.contains("No links found for base domain"), "{}", error);
    assert!(report.bundle.conventional_tree.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_semantic_tree_from_model() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    let base = server.uri();

    let reply = format!(
        r#"```json
{{"categories": [
  {{"name": "Guides", "description": "Start here", "links": [
    {{"url": "{base}/docs/intro", "text": "Introduction", "importance": 5}},
    {{"url": "{base}/docs/setup", "text": "Setup", "importance": 4}}
  ]}}
]}}
```"#
    );
    let semantic = SemanticCategorizer::new(Arc::new(CannedClient { reply }));

    let cache_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(&cache_dir))
        .unwrap()
        .with_semantic(semantic);
    let report = coordinator.crawl(&base, false).await;
    assert!(report.is_ok());

    let tree = &report.bundle.enhanced_tree;
    let guides = tree.get("category_guides").unwrap();
    assert_eq!(guides.label, "Guides");
    assert_eq!(guides.kind.description(), Some("Start here"));

    let intro = tree
        .links()
        .find(|node| node.kind.url() == Some(format!("{}/docs/intro", base).as_str()))
        .unwrap();
    assert!(matches!(
        intro.kind,
        NodeKind::Link {
            importance: Some(5),
            ..
        }
    ));

    // Pages from either tree are fetched
    assert_eq!(report.bundle.pages.len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unparseable_model_reply_falls_back() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;

    let semantic = SemanticCategorizer::new(Arc::new(CannedClient {
        reply: "I could not categorize these links.".to_string(),
    }));
    let cache_dir = TempDir::new().unwrap();
    let coordinator = Coordinator::new(create_test_config(&cache_dir))
        .unwrap()
        .with_semantic(semantic);
    let report = coordinator.crawl(&server.uri(), false).await;

    assert_eq!(
        report.bundle.enhanced_tree.serialize(),
        report.bundle.conventional_tree.serialize()
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gemini_client_end_to_end() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    let base = server.uri();

    let categories = json!({
        "categories": [{
            "name": "Blog",
            "description": "Announcements",
            "links": [{"url": format!("{}/blog/post", base), "text": "First post", "importance": 2}]
        }]
    });
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": categories.to_string()}]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        "test-key".to_string(),
        "gemini-test".to_string(),
        format!("{}/v1beta", base),
    )
    .unwrap();

    let cache_dir = TempDir::new().unwrap();
    let cache = CacheLayer::new(cache_dir.path()).with_config_hash("feedface");
    let coordinator = Coordinator::new(create_test_config(&cache_dir))
        .unwrap()
        .with_cache(cache)
        .with_semantic(SemanticCategorizer::new(Arc::new(client)));
    let report = coordinator.crawl(&base, false).await;

    assert!(report.is_ok());
    let blog = report.bundle.enhanced_tree.get("category_blog").unwrap();
    assert_eq!(blog.kind.description(), Some("Announcements"));
    assert!(coordinator.cache().is_cached(&report.domain));
}
