//! Integration tests for logging and tracing

use std::io;
use std::sync::{Arc, Mutex};

use comtrade_downloader::downloader::executor::parse_body;
use comtrade_downloader::downloader::MultiRequest;
use comtrade_downloader::OutputFormat;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{executor, wood_query, CSV_BODY};

/// Log sink shared between the subscriber and the test
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Install a capturing subscriber for the current thread
fn capture(filter: &str) -> (CapturedLogs, tracing::subscriber::DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

#[test]
fn test_warn_logged_for_unparseable_body() {
    let (logs, _guard) = capture("comtrade_downloader=debug");

    let _ = parse_body("USAGE LIMIT: Hourly usage limit reached", OutputFormat::Json);

    let output = logs.contents();
    assert!(output.contains("WARN"), "got: {output}");
    assert!(output.contains("assuming usage limit"), "got: {output}");
}

#[test]
fn test_env_filter_hides_lower_levels() {
    let (logs, _guard) = capture("comtrade_downloader=warn");

    parse_body("a,b\n1,2\n", OutputFormat::Csv).unwrap();
    assert!(logs.contents().is_empty(), "got: {}", logs.contents());

    let _ = parse_body("not json", OutputFormat::Json);
    assert!(logs.contents().contains("assuming usage limit"));
}

#[test]
fn test_debug_filter_shows_parsed_shape() {
    let (logs, _guard) = capture("comtrade_downloader=debug");

    parse_body("a,b\n1,2\n", OutputFormat::Csv).unwrap();
    assert!(logs.contents().contains("Parsed table with shape (1, 2)"));
}

#[tokio::test]
async fn test_batch_logs_requests_inside_span() {
    let (logs, _guard) = capture("comtrade_downloader=info");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(CSV_BODY))
        .mount(&server)
        .await;

    let codes: Vec<String> = (0..21).map(|i| (1000 + i).to_string()).collect();
    let mut batch = MultiRequest::from_template(wood_query(&server), &codes, &[])
        .unwrap()
        .with_executor(executor(10));
    let table = batch.pull_data().await.unwrap();
    assert_eq!(table.num_rows(), 6);

    let output = logs.contents();
    assert_eq!(output.matches("Requesting Comtrade data").count(), 2, "got: {output}");
    assert!(output.contains("batch_pull{requests=2}"), "got: {output}");
    assert!(output.contains("Batch complete: 6 rows"), "got: {output}");
}
