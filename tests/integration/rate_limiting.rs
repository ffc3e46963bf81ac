//! Integration tests for request pacing

use std::time::{Duration, Instant};

use comtrade_downloader::downloader::{ClientConfig, ComtradeRequest, MultiRequest, RequestExecutor};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{wood_query, CSV_BODY};

async fn csv_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_consecutive_pulls_are_spaced() {
    let server = csv_server().await;
    let config = ClientConfig {
        min_request_interval_ms: 200,
        max_requests: 10,
        batch_pacing_ms: 0,
    };
    let executor = RequestExecutor::with_client(reqwest::Client::new(), config);
    let mut request = ComtradeRequest::with_executor(wood_query(&server), executor);

    let start = Instant::now();
    request.pull_data().await.unwrap();
    let first = start.elapsed();
    request.pull_data().await.unwrap();
    request.pull_data().await.unwrap();

    // First pull is not delayed, the next two wait out the interval
    assert!(first < Duration::from_millis(200));
    assert!(start.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_batch_pacing_between_sub_requests() {
    let server = csv_server().await;
    let config = ClientConfig {
        min_request_interval_ms: 0,
        max_requests: 10,
        batch_pacing_ms: 150,
    };
    let executor = RequestExecutor::with_client(reqwest::Client::new(), config);

    let codes: Vec<String> = (0..41).map(|i| (1000 + i).to_string()).collect();
    let mut batch = MultiRequest::from_template(wood_query(&server), &codes, &[])
        .unwrap()
        .with_executor(executor);

    let start = Instant::now();
    let table = batch.pull_data().await.unwrap();

    assert_eq!(table.num_rows(), 9);
    assert!(start.elapsed() >= Duration::from_millis(300));
}
