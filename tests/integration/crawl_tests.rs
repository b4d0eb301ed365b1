//! Full runs against a mock server

use crate::test_user_agent;
use sumi_swarm::config::{
    CacheConfig, CachePolicy, ClientConfig, ClientMode, Config, SessionConfig, WorkerConfig,
};
use sumi_swarm::crawler::{run, RunResults};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration over the given seeds
fn create_test_config(seeds: Vec<String>, crawl: bool, mode: ClientMode) -> Config {
    Config {
        seeds,
        workers: WorkerConfig {
            count: 3,
            idle_poll_ms: 10,
            crawl,
            same_host: true,
        },
        client: ClientConfig {
            mode,
            retry_count: 1,
        },
        cache: CacheConfig::default(),
        session: SessionConfig::default(),
        user_agent: test_user_agent(),
    }
}

async fn mount_page(mock_server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/html"),
        )
        .expect(1)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2#section">Page 2</a>
            <a href="https://elsewhere.invalid/">Elsewhere</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;

    mount_page(
        &mock_server,
        "/page1",
        r#"<html><body><a href="/page2">Page 2</a><a href="/missing">Gone</a></body></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        &mock_server,
        "/page2",
        r#"<html><body><a href="/">Home</a></body></html>"#.to_string(),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(vec![format!("{}/", base_url)], true, ClientMode::Text);
    let output = run(&config, Vec::new()).await.expect("Run failed");

    let results = match output.results {
        RunResults::Text(results) => results,
        RunResults::Bytes(_) => panic!("expected text results"),
    };

    let mut urls: Vec<String> = results.keys().cloned().collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );
    assert!(results[&format!("{}/page2", base_url)].contains("Home"));

    // The 404 page was attempted once and dropped; the other host never was
    assert_eq!(output.stats.attempted, 4);
    assert_eq!(output.stats.failed, 1);
    assert_eq!(output.stats.frontier_size, 4);

    let sessions = output.stats.sessions.expect("Missing session stats");
    assert_eq!(sessions.opened, sessions.closed);
}

#[tokio::test]
async fn test_seed_without_trailing_slash_fetched_once() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Links back to itself in two spellings
    mount_page(
        &mock_server,
        "/",
        format!(r#"<a href="/">Home</a><a href="{}#top">Top</a>"#, base_url),
    )
    .await;

    let mut config = create_test_config(Vec::new(), true, ClientMode::Text);
    config.workers.count = 2;
    let output = run(&config, vec![base_url.clone(), format!("{}/", base_url)])
        .await
        .expect("Run failed");

    let results = match output.results {
        RunResults::Text(results) => results,
        RunResults::Bytes(_) => panic!("expected text results"),
    };
    assert_eq!(
        results.keys().cloned().collect::<Vec<_>>(),
        vec![format!("{}/", base_url)]
    );
    assert_eq!(output.stats.attempted, 1);
    assert_eq!(output.stats.frontier_size, 1);
}

#[tokio::test]
async fn test_fetch_without_crawling() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/a",
        format!(r#"<a href="{}/b">B</a>"#, base_url),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(Vec::new(), false, ClientMode::Text);
    let output = run(&config, vec![format!("{}/a", base_url)])
        .await
        .expect("Run failed");

    assert_eq!(output.results.len(), 1);
    assert_eq!(output.stats.discovered, 0);
}

#[tokio::test]
async fn test_bytes_mode() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3, 4]))
        .mount(&mock_server)
        .await;

    let seeds = vec![format!("{}/blob", base_url)];
    let config = create_test_config(seeds, false, ClientMode::Bytes);
    let output = run(&config, Vec::new()).await.expect("Run failed");

    match output.results {
        RunResults::Bytes(results) => {
            assert_eq!(results[&format!("{}/blob", base_url)], vec![1u8, 2, 3, 4]);
        }
        RunResults::Text(_) => panic!("expected byte results"),
    }
}

#[tokio::test]
async fn test_cache_through_run_is_replayable() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let cache_dir = tempfile::tempdir().unwrap();

    mount_page(&mock_server, "/once", "<html>once</html>".to_string()).await;

    let seeds = vec![format!("{}/once", base_url)];
    let mut config = create_test_config(seeds, false, ClientMode::Text);
    config.cache = CacheConfig {
        policy: CachePolicy::Through,
        directory: Some(cache_dir.path().display().to_string()),
    };

    // The second run is served from the cache; the mock expects one request
    for _ in 0..2 {
        let output = run(&config, Vec::new()).await.expect("Run failed");
        assert_eq!(output.results.len(), 1);
    }

    // Cache-skip refuses keys that are already cached
    config.cache.policy = CachePolicy::Skip;
    let output = run(&config, Vec::new()).await.expect("Run failed");
    assert!(output.results.is_empty());
    assert_eq!(output.stats.failed, 1);
}
