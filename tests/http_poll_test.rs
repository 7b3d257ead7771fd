mod common;

use common::{INVOICE_ID, invoice_response};
use ghostpay_sync::application::synchronizer::{StatusSynchronizer, watch};
use ghostpay_sync::domain::invoice::InvoiceId;
use ghostpay_sync::domain::ports::StatusSource;
use ghostpay_sync::domain::status::Status;
use ghostpay_sync::error::SyncError;
use ghostpay_sync::infrastructure::http::{HttpStatusSource, build_client};
use ghostpay_sync::infrastructure::in_memory::{RecordingClock, RecordingSink};
use ghostpay_sync::infrastructure::poll::{PollSchedule, PollTransport};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> HttpStatusSource {
    let http = build_client(Duration::from_secs(5)).unwrap();
    HttpStatusSource::new(
        http,
        &server.uri().parse().unwrap(),
        &InvoiceId::new(INVOICE_ID),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn test_fetch_reads_status_from_invoice_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/invoice/{INVOICE_ID}")))
        .respond_with(invoice_response("sweeping"))
        .expect(1)
        .mount(&server)
        .await;

    let status = source_for(&server).fetch().await.unwrap();
    assert_eq!(status, Status::Sweeping);
}

#[tokio::test]
async fn test_fetch_not_found_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "not found"})))
        .mount(&server)
        .await;

    let err = source_for(&server).fetch().await.unwrap_err();
    assert!(matches!(err, SyncError::UnexpectedStatus { status: 404, .. }));
}

#[tokio::test]
async fn test_fetch_malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = source_for(&server).fetch().await.unwrap_err();
    assert!(matches!(err, SyncError::Payload(_)));
}

#[tokio::test]
async fn test_fetch_unreachable_is_an_error() {
    let http = build_client(Duration::from_millis(200)).unwrap();
    let source = HttpStatusSource::new(
        http,
        &"http://127.0.0.1:1".parse().unwrap(),
        &InvoiceId::new(INVOICE_ID),
        Duration::from_millis(200),
    )
    .unwrap();

    assert!(matches!(source.fetch().await, Err(SyncError::Http(_))));
}

#[tokio::test]
async fn test_poll_over_http_recovers_from_server_error() {
    let server = MockServer::start().await;
    let invoice_path = format!("/api/invoice/{INVOICE_ID}");
    Mock::given(method("GET"))
        .and(path(invoice_path.clone()))
        .respond_with(invoice_response("pending"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(invoice_path.clone()))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(invoice_path.clone()))
        .respond_with(invoice_response("confirming"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(invoice_path))
        .respond_with(invoice_response("completed"))
        .mount(&server)
        .await;

    let clock = RecordingClock::new();
    let mut transport = PollTransport::new(source_for(&server), clock.clone(), PollSchedule::default());
    let mut sync = StatusSynchronizer::new(RecordingSink::new());

    let last = watch(&mut transport, &mut sync).await.unwrap();

    assert_eq!(last, Status::Completed);
    assert_eq!(
        sync.sink().rendered(),
        &[Status::Confirming, Status::Completed]
    );
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 4);
    assert_eq!(
        clock.delays().await,
        vec![
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_secs(15),
            Duration::from_secs(10),
        ]
    );
}
