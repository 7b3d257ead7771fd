mod common;

use common::{INVOICE_ID, status_stream, stream_response};
use ghostpay_sync::application::synchronizer::{StatusSynchronizer, watch};
use ghostpay_sync::domain::invoice::InvoiceId;
use ghostpay_sync::domain::ports::{EventConnection, EventConnector};
use ghostpay_sync::domain::status::Status;
use ghostpay_sync::error::SyncError;
use ghostpay_sync::infrastructure::http::build_client;
use ghostpay_sync::infrastructure::in_memory::{RecordingClock, RecordingSink};
use ghostpay_sync::infrastructure::push::PushTransport;
use ghostpay_sync::infrastructure::sse::HttpEventConnector;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn stream_path() -> String {
    format!("/checkout/pay/{INVOICE_ID}/stream")
}

fn connector_for(server: &MockServer) -> HttpEventConnector {
    let http = build_client(Duration::from_secs(5)).unwrap();
    let base = format!("{}/checkout/", server.uri());
    HttpEventConnector::new(http, &base.parse().unwrap(), &InvoiceId::new(INVOICE_ID)).unwrap()
}

#[tokio::test]
async fn test_stream_delivers_deduplicated_statuses_and_stops() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(stream_path()))
        .and(header("accept", "text/event-stream"))
        .respond_with(stream_response(status_stream(&[
            "confirming",
            "confirming",
            "expired",
            "pending",
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let clock = RecordingClock::new();
    let mut transport = PushTransport::new(connector_for(&server), clock.clone());
    let mut sync = StatusSynchronizer::new(RecordingSink::new());

    let last = watch(&mut transport, &mut sync).await.unwrap();

    assert_eq!(last, Status::Expired);
    assert_eq!(sync.sink().rendered(), &[Status::Confirming, Status::Expired]);
    assert!(clock.delays().await.is_empty());
}

#[tokio::test]
async fn test_stream_reconnects_after_server_hangs_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(stream_path()))
        .respond_with(stream_response(format!(
            "retry: 250\n{}",
            status_stream(&["confirming"])
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(stream_path()))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(stream_path()))
        .respond_with(stream_response(status_stream(&["sweeping", "completed"])))
        .mount(&server)
        .await;

    let clock = RecordingClock::new();
    let mut transport = PushTransport::new(connector_for(&server), clock.clone());
    let mut sync = StatusSynchronizer::new(RecordingSink::new());

    let last = watch(&mut transport, &mut sync).await.unwrap();

    assert_eq!(last, Status::Completed);
    assert_eq!(
        sync.sink().rendered(),
        &[Status::Confirming, Status::Sweeping, Status::Completed]
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(
        clock.delays().await,
        vec![Duration::from_millis(250), Duration::from_millis(250)]
    );
}

#[tokio::test]
async fn test_connect_rejects_non_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = connector_for(&server).connect(None).await;
    assert!(matches!(
        result,
        Err(SyncError::UnexpectedStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_connect_sends_last_event_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(stream_path()))
        .and(header("last-event-id", "17"))
        .respond_with(stream_response(status_stream(&["completed"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut conn = connector_for(&server).connect(Some("17")).await.unwrap();
    let event = conn.next_event().await.unwrap().unwrap();
    assert_eq!(event.event, "status");
    conn.close().await;
    assert!(matches!(
        conn.next_event().await,
        Err(SyncError::StreamClosed)
    ));
}

#[tokio::test]
async fn test_retry_only_block_sets_delay_before_hang_up() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(stream_path()))
        .respond_with(stream_response(format!(
            "{}id: 8\nretry: 10000\n\n",
            status_stream(&["confirming"])
        )))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(stream_path()))
        .and(header("last-event-id", "8"))
        .respond_with(stream_response(status_stream(&["completed"])))
        .expect(1)
        .mount(&server)
        .await;

    let clock = RecordingClock::new();
    let mut transport = PushTransport::new(connector_for(&server), clock.clone());
    let mut sync = StatusSynchronizer::new(RecordingSink::new());

    let last = watch(&mut transport, &mut sync).await.unwrap();

    assert_eq!(last, Status::Completed);
    assert_eq!(clock.delays().await, vec![Duration::from_secs(10)]);
}
