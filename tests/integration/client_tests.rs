//! Transport and decorator clients against a mock server

use crate::test_user_agent;
use std::sync::Arc;
use sumi_swarm::client::{CacheClient, Client, ImageClient, RetryClient, WebTextClient};
use sumi_swarm::config::SessionConfig;
use sumi_swarm::session::{SessionBuilder, SessionPool, SingleSessionPool};
use sumi_swarm::{FetchError, FileCache};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn direct_pool() -> Arc<dyn SessionPool> {
    let builder = SessionBuilder::from_config(&test_user_agent(), &SessionConfig::default())
        .expect("Failed to create session builder");
    Arc::new(SingleSessionPool::new(&builder).expect("Failed to open session"))
}

#[tokio::test]
async fn test_text_client_fetches_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html><body>Hello</body></html>", "text/html"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = WebTextClient::new(direct_pool());
    let body = client
        .fetch(&format!("{}/page", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(body, "<html><body>Hello</body></html>");
}

#[tokio::test]
async fn test_text_client_rejects_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = WebTextClient::new(direct_pool());
    let err = client
        .fetch(&format!("{}/missing", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_image_client_checks_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let client = ImageClient::new(direct_pool());

    let image = client
        .fetch(&format!("{}/logo.png", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(image, vec![0x89, b'P', b'N', b'G']);

    let err = client
        .fetch(&format!("{}/page.html", mock_server.uri()))
        .await
        .unwrap_err();
    match err {
        FetchError::ContentType { content_type, .. } => {
            assert_eq!(content_type.as_deref(), Some("text/html"));
        }
        other => panic!("expected content type error, got {}", other),
    }
}

#[tokio::test]
async fn test_cache_through_hits_server_once() {
    let mock_server = MockServer::start().await;
    let cache_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(200).set_body_string("cached body"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CacheClient::new(
        WebTextClient::new(direct_pool()),
        FileCache::new(cache_dir.path()),
    );
    let url = format!("{}/cached", mock_server.uri());

    assert_eq!(client.fetch(&url).await.unwrap(), "cached body");
    assert_eq!(client.fetch(&url).await.unwrap(), "cached body");

    // A fresh client over the same folder is served from disk too
    let replay = CacheClient::new(
        WebTextClient::new(direct_pool()),
        FileCache::new(cache_dir.path()),
    );
    assert_eq!(replay.fetch(&url).await.unwrap(), "cached body");
}

#[tokio::test]
async fn test_retry_recovers_from_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RetryClient::new(WebTextClient::new(direct_pool()), 3).unwrap();
    let body = client
        .fetch(&format!("{}/flaky", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(body, "finally");
}

#[tokio::test]
async fn test_retry_exhaustion_reports_last_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = RetryClient::new(WebTextClient::new(direct_pool()), 2).unwrap();
    let err = client
        .fetch(&format!("{}/down", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }));
}
