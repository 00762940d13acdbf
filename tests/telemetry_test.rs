//! End-to-end tests for the outbound-call telemetry interceptor: a real
//! HTTP exchange against a local server, flowing through the diagnostic
//! registry into span tags.

mod common;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    http::{HeaderMap, HeaderValue},
    routing::get,
    Router,
};
use london_travel_site::telemetry::{
    DiagnosticRegistry, HttpDiagnosticListener, HttpDiagnosticSubscriber, SiteHttpClient,
    SpanTagger, TelemetryUrlFilter,
};

struct RecordingTagger {
    tags: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingTagger {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            tags: Mutex::new(Vec::new()),
        })
    }

    fn tags(&self) -> Vec<(&'static str, String)> {
        self.tags.lock().unwrap().clone()
    }
}

impl SpanTagger for RecordingTagger {
    fn add_tag(&self, key: &'static str, value: String) {
        self.tags.lock().unwrap().push((key, value));
    }
}

/// Serve a single route that answers with Cosmos-style vendor headers.
async fn spawn_upstream() -> SocketAddr {
    let app = Router::new().route(
        "/",
        get(|| async {
            let mut headers = HeaderMap::new();
            headers.insert("x-ms-activity-id", HeaderValue::from_static("abc"));
            headers.append("x-ms-request-charge", HeaderValue::from_static("1.5"));
            (headers, "ok")
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn interceptor(
    registry: &Arc<DiagnosticRegistry>,
    ingestion_hosts: Vec<String>,
) -> (HttpDiagnosticSubscriber, Arc<RecordingTagger>) {
    let tagger = RecordingTagger::new();
    let listener = Arc::new(HttpDiagnosticListener::new(
        TelemetryUrlFilter::new(ingestion_hosts),
        Arc::clone(&tagger) as Arc<dyn SpanTagger>,
    ));
    let subscriber = HttpDiagnosticSubscriber::subscribe(registry, listener);
    (subscriber, tagger)
}

#[tokio::test]
async fn completed_responses_tag_the_active_span() {
    let addr = spawn_upstream().await;
    let registry = DiagnosticRegistry::new();
    let (_subscriber, tagger) = interceptor(&registry, vec!["telemetry.invalid".to_string()]);

    let client = SiteHttpClient::new(&registry);
    let response = client.get(&format!("http://{addr}/")).await.unwrap();
    assert!(response.status().is_success());

    assert_eq!(
        tagger.tags(),
        vec![
            ("Activity Id", "abc".to_string()),
            ("Request Charge", "1.5".to_string()),
        ]
    );
}

#[tokio::test]
async fn calls_to_the_telemetry_backend_are_not_tagged() {
    let addr = spawn_upstream().await;
    let registry = DiagnosticRegistry::new();

    // The local upstream plays the part of the telemetry ingestion endpoint.
    let (_subscriber, tagger) = interceptor(&registry, vec!["127.0.0.1".to_string()]);

    let client = SiteHttpClient::new(&registry);
    client.get(&format!("http://{addr}/")).await.unwrap();

    assert!(tagger.tags().is_empty());
}

#[tokio::test]
async fn closed_subscriber_stops_tagging_and_double_close_is_safe() {
    let addr = spawn_upstream().await;
    let registry = DiagnosticRegistry::new();
    let (subscriber, tagger) = interceptor(&registry, Vec::new());

    let client = SiteHttpClient::new(&registry);
    client.get(&format!("http://{addr}/")).await.unwrap();
    assert_eq!(tagger.tags().len(), 2);

    subscriber.close();
    subscriber.close();

    client.get(&format!("http://{addr}/")).await.unwrap();
    assert_eq!(tagger.tags().len(), 2);
}
