//! Integration tests for batch planning and execution

use comtrade_downloader::downloader::MultiRequest;
use comtrade_downloader::query::QueryParams;
use comtrade_downloader::ComtradeError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{executor, wood_query, API_PATH, CSV_BODY};

fn codes(n: usize) -> Vec<String> {
    (0..n).map(|i| (1000 + i).to_string()).collect()
}

#[test]
fn test_plan_from_params() {
    let params = QueryParams {
        partner_area: Some(36u64.into()),
        reporting_area: Some("all".into()),
        time_period: Some((1987u64..2017).collect::<Vec<u64>>().into()),
        hs: Some(
            codes(21)
                .iter()
                .map(String::as_str)
                .collect::<Vec<&str>>()
                .into(),
        ),
        freq: Some("A".to_string()),
        trade_type: Some("C".to_string()),
        ..Default::default()
    };

    let batch = MultiRequest::from_params(&params).unwrap();
    // 2 code chunks x 6 period chunks
    assert_eq!(batch.len(), 12);

    let first = &batch.queries()[0];
    assert_eq!(first.commodity_codes().unwrap().len(), 20);
    assert_eq!(first.time_period().unwrap(), &[1987, 1988, 1989, 1990, 1991]);
    assert!(first
        .url()
        .starts_with("http://comtrade.un.org/api/get?p=36&r=all&freq=A&type=C&px=HS&cc=1000,"));

    // Code chunks vary slowest
    let seventh = &batch.queries()[6];
    assert_eq!(seventh.commodity_codes().unwrap(), &["1020".to_string()]);
    assert_eq!(seventh.time_period().unwrap(), &[1987, 1988, 1989, 1990, 1991]);
}

#[test]
fn test_plan_over_limit_fails() {
    let params = QueryParams {
        partner_area: Some(36u64.into()),
        reporting_area: Some("all".into()),
        time_period: Some((1900u64..2010).collect::<Vec<u64>>().into()),
        hs: Some(
            codes(100)
                .iter()
                .map(String::as_str)
                .collect::<Vec<&str>>()
                .into(),
        ),
        ..Default::default()
    };

    // 5 code chunks x 22 period chunks
    let err = MultiRequest::from_params(&params).err().unwrap();
    assert!(matches!(
        err,
        ComtradeError::LimitExceeded { planned: 110, limit: 100 }
    ));
}

#[test]
fn test_display_lists_urls() {
    let params = QueryParams {
        partner_area: Some(36u64.into()),
        time_period: Some(vec![2010u64, 2011, 2012, 2013, 2014, 2015].into()),
        ..Default::default()
    };
    let batch = MultiRequest::from_params(&params).unwrap();
    let text = batch.to_string();

    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("Currently storing 2 Comtrade Requests with URLs:")
    );
    assert_eq!(lines.next(), Some(batch.queries()[0].url()));
    assert_eq!(lines.next(), Some(batch.queries()[1].url()));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn test_batch_concatenates_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(2)
        .mount(&server)
        .await;

    let mut batch = MultiRequest::from_template(wood_query(&server), &codes(21), &[])
        .unwrap()
        .with_executor(executor(100));
    assert_eq!(batch.len(), 2);

    let table = batch.pull_data().await.unwrap();
    assert_eq!(table.shape(), (6, 9));
    assert_eq!(batch.requests_made(), 2);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    let second_cc = received[1]
        .url
        .query_pairs()
        .find(|(k, _)| k == "cc")
        .map(|(_, v)| v.into_owned());
    assert_eq!(second_cc.as_deref(), Some("1020"));
}

#[tokio::test]
async fn test_failure_aborts_batch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("cc", "1020"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string("status,message\n500,Internal Server Error\n"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(1)
        .mount(&server)
        .await;

    // Chunks 1000..=1019 and 1020
    let mut batch = MultiRequest::from_template(wood_query(&server), &codes(21), &[])
        .unwrap()
        .with_executor(executor(100));
    assert_eq!(batch.len(), 2);

    let err = batch.pull_data().await.unwrap_err();
    assert!(matches!(err, ComtradeError::Network(_)), "got {err:?}");
    assert_eq!(batch.requests_made(), 2);
}

#[tokio::test]
async fn test_columns_empty_in_one_sub_request_survive() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("cc", "1020"))
        .respond_with(ResponseTemplate::new(200).set_body_string("yr,rtCode,Flag,qtAltCode\n2016,842,1,\n"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("yr,rtCode,Flag,qtAltCode\n2016,36,,\n2016,124,,\n"))
        .expect(1)
        .mount(&server)
        .await;

    let mut batch = MultiRequest::from_template(wood_query(&server), &codes(21), &[])
        .unwrap()
        .with_executor(executor(100));
    let table = batch.pull_data().await.unwrap();

    // Flag is only filled by the second sub-request; qtAltCode is empty everywhere
    assert_eq!(table.columns(), &["yr", "rtCode", "Flag"]);
    assert_eq!(
        table.column("Flag").unwrap(),
        vec![None, None, Some("1")]
    );
}

#[tokio::test]
async fn test_mismatched_columns_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("cc", "1020"))
        .respond_with(ResponseTemplate::new(200).set_body_string("yr,rtCode\n2016,36\n"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .mount(&server)
        .await;

    let mut batch = MultiRequest::from_template(wood_query(&server), &codes(21), &[])
        .unwrap()
        .with_executor(executor(100));

    assert!(matches!(
        batch.pull_data().await,
        Err(ComtradeError::Schema(_))
    ));
}

#[tokio::test]
async fn test_batch_shares_quota() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .expect(2)
        .mount(&server)
        .await;

    let mut batch = MultiRequest::from_template(wood_query(&server), &codes(41), &[])
        .unwrap()
        .with_executor(executor(2));
    assert_eq!(batch.len(), 3);

    assert!(matches!(
        batch.pull_data().await,
        Err(ComtradeError::Quota { issued: 2, limit: 2 })
    ));
}
