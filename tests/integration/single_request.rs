//! Integration tests for single requests against a mock API

use comtrade_downloader::downloader::ComtradeRequest;
use comtrade_downloader::{ComtradeError, OutputFormat, TradeFlow};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{executor, wood_query, API_PATH, CSV_BODY, JSON_BODY, NO_DATA_BODY};

#[tokio::test]
async fn test_pull_csv_drops_empty_columns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("p", "36"))
        .and(query_param("r", "all"))
        .and(query_param("ps", "2016"))
        .and(query_param("px", "HS"))
        .and(query_param("cc", "4401"))
        .and(query_param("fmt", "csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = ComtradeRequest::with_executor(wood_query(&server), executor(100));
    let table = request.pull_data().await.unwrap();

    assert_eq!(table.shape(), (3, 9));
    assert!(!table.columns().iter().any(|c| c == "2nd Partner"));
    assert_eq!(
        table.column("Reporter").unwrap(),
        vec![Some("USA"), Some("USA"), Some("Canada")]
    );
    assert_eq!(request.requests_made(), 1);
}

#[tokio::test]
async fn test_pull_json_dataset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .and(query_param("fmt", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(JSON_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let mut query = wood_query(&server);
    query.set_fmt(OutputFormat::Json);
    let mut request = ComtradeRequest::with_executor(query, executor(100));
    let table = request.pull_data().await.unwrap();

    assert_eq!(table.num_rows(), 2);
    assert!(!table.columns().iter().any(|c| c == "pt2Title"));
    assert_eq!(
        table.column("TradeValue").unwrap(),
        vec![Some("1200"), Some("3400")]
    );
}

#[tokio::test]
async fn test_no_data_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(NO_DATA_BODY))
        .mount(&server)
        .await;

    let mut request = ComtradeRequest::with_executor(wood_query(&server), executor(100));
    let err = request.pull_data().await.unwrap_err();
    assert!(matches!(err, ComtradeError::NotFound), "got {err:?}");
    // The failed pull still counts against the quota
    assert_eq!(request.requests_made(), 1);
}

#[tokio::test]
async fn test_http_429_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let mut request = ComtradeRequest::with_executor(wood_query(&server), executor(100));
    assert!(matches!(
        request.pull_data().await,
        Err(ComtradeError::RateLimit(_))
    ));
}

#[tokio::test]
async fn test_unparseable_body_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("USAGE LIMIT: Hourly usage limit of 100 actions reached."),
        )
        .mount(&server)
        .await;

    let mut query = wood_query(&server);
    query.set_fmt(OutputFormat::Json);
    let mut request = ComtradeRequest::with_executor(query, executor(100));
    match request.pull_data().await {
        Err(ComtradeError::RateLimit(msg)) => assert!(!msg.is_empty()),
        other => panic!("expected RateLimit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_with_table_body_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(503).set_body_string("status,message\n503,Service Unavailable\n"),
        )
        .mount(&server)
        .await;

    let mut request = ComtradeRequest::with_executor(wood_query(&server), executor(100));
    assert!(matches!(
        request.pull_data().await,
        Err(ComtradeError::Network(_))
    ));
}

#[tokio::test]
async fn test_unparseable_error_status_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_string("USAGE LIMIT: Hourly usage limit of 100 actions reached."),
        )
        .mount(&server)
        .await;

    let mut query = wood_query(&server);
    query.set_fmt(OutputFormat::Json);
    let mut request = ComtradeRequest::with_executor(query, executor(100));
    match request.pull_data().await {
        Err(ComtradeError::RateLimit(msg)) => assert!(msg.starts_with("HTTP 409"), "got {msg}"),
        other => panic!("expected RateLimit, got {other:?}"),
    }
}

#[tokio::test]
async fn test_html_error_page_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(502).set_body_string("<html><body>Bad Gateway</body></html>"),
        )
        .mount(&server)
        .await;

    let mut query = wood_query(&server);
    query.set_fmt(OutputFormat::Json);
    let mut request = ComtradeRequest::with_executor(query, executor(100));
    assert!(matches!(
        request.pull_data().await,
        Err(ComtradeError::RateLimit(_))
    ));
}

#[tokio::test]
async fn test_quota_stops_before_sending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(2)
        .mount(&server)
        .await;

    let mut request = ComtradeRequest::with_executor(wood_query(&server), executor(2));
    request.pull_data().await.unwrap();
    request.pull_data().await.unwrap();

    let err = request.pull_data().await.unwrap_err();
    assert!(matches!(err, ComtradeError::Quota { issued: 2, limit: 2 }));
    assert_eq!(request.requests_made(), 2);
}

#[tokio::test]
async fn test_changed_query_shares_quota() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("rg", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = ComtradeRequest::with_executor(wood_query(&server), executor(2));
    request.pull_data().await.unwrap();

    request.query_mut().set_trade_flow(TradeFlow::Export);
    assert!(request.url().contains("rg=2"));
    request.pull_data().await.unwrap();

    assert!(matches!(
        request.pull_data().await,
        Err(ComtradeError::Quota { .. })
    ));
}

#[tokio::test]
async fn test_display_shows_url() {
    let server = MockServer::start().await;
    let request = ComtradeRequest::with_executor(wood_query(&server), executor(1));
    assert_eq!(
        request.to_string(),
        format!("Current Comtrade Request URL: {}", request.url())
    );
    assert!(request
        .url()
        .ends_with("?p=36&r=all&ps=2016&px=HS&cc=4401&freq=A&type=C&fmt=csv"));
}
