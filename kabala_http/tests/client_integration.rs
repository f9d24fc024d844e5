use std::time::Duration;

use kabala_http::{Client, FetchOutcome, PageSource, USER_AGENTS};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn fetch_success_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/cost-of-living/in/Berlin"))
        .and(query_param("displayCurrency", "USD"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>prices</html>"))
        .mount(&mock_server)
        .await;

    let client = Client::new().unwrap();
    let url = format!(
        "{}/cost-of-living/in/Berlin?displayCurrency=USD",
        mock_server.uri()
    );
    let outcome = client.fetch(&url).await;

    assert_eq!(
        outcome,
        FetchOutcome::Success {
            status: 200,
            body: "<html>prices</html>".to_string()
        }
    );
}

#[tokio::test]
async fn fetch_sends_pooled_user_agent_and_browser_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let client = Client::new().unwrap();
    client.fetch(&format!("{}/page", mock_server.uri())).await;

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let ua = requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(USER_AGENTS.contains(&ua));
    assert!(requests[0].headers.get("accept-language").is_some());
    assert!(requests[0].headers.get("sec-fetch-mode").is_some());
}

#[tokio::test]
async fn fetch_429_with_retry_after_is_rate_limited() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "45"))
        .mount(&mock_server)
        .await;

    let client = Client::new().unwrap();
    let outcome = client.fetch(&format!("{}/page", mock_server.uri())).await;

    assert_eq!(
        outcome,
        FetchOutcome::RateLimited {
            status: 429,
            retry_after: Some(Duration::from_secs(45))
        }
    );
    assert_eq!(outcome.html(), None);
}

#[tokio::test]
async fn fetch_403_is_rate_limited_without_hint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&mock_server)
        .await;

    let client = Client::new().unwrap();
    let outcome = client.fetch(&format!("{}/page", mock_server.uri())).await;

    assert!(outcome.is_rate_limited());
    assert_eq!(outcome.status(), 403);
    assert_eq!(outcome.retry_after(), None);
}

#[tokio::test]
async fn fetch_404_is_permanent_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let client = Client::new().unwrap();
    let outcome = client
        .fetch_page(&format!("{}/page", mock_server.uri()))
        .await;

    assert_eq!(outcome, FetchOutcome::Failed { status: 404 });
}

#[tokio::test]
async fn fetch_unreachable_host_is_network_error() {
    let client = Client::with_timeout(Duration::from_secs(2)).unwrap();
    let outcome = client.fetch("http://127.0.0.1:1/page").await;

    assert!(matches!(outcome, FetchOutcome::Network { .. }));
    assert_eq!(outcome.status(), 0);
}
