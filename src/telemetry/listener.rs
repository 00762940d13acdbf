use std::sync::Arc;

use http::HeaderMap;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::diagnostics::{EventObserver, Payload};
use super::payload::{ResponseFetcher, ResponseSnapshot};
use super::url_filter::TelemetryUrlFilter;

/// Name of the diagnostic event carrying a completed HTTP response.
pub const HTTP_RESPONSE_EVENT: &str = "http.client.response";

const ACTIVITY_ID_HEADER: &str = "x-ms-activity-id";
const REQUEST_CHARGE_HEADER: &str = "x-ms-request-charge";

/// Writes key/value tags onto the currently active trace span. Tagging is
/// best-effort; implementations must never fail the caller.
pub trait SpanTagger: Send + Sync {
    fn add_tag(&self, key: &'static str, value: String);
}

/// Default tagger backed by the tracing/OpenTelemetry bridge. With no span
/// active the write lands on the disabled span and is dropped.
pub struct OtelSpanTagger;

impl SpanTagger for OtelSpanTagger {
    fn add_tag(&self, key: &'static str, value: String) {
        tracing::Span::current().set_attribute(key, value);
    }
}

/// Consumes completed-response diagnostic events and annotates the active
/// span with the Cosmos-style activity id and request charge headers.
pub struct HttpDiagnosticListener {
    filter: TelemetryUrlFilter,
    response_fetcher: ResponseFetcher,
    tagger: Arc<dyn SpanTagger>,
}

impl HttpDiagnosticListener {
    pub fn new(filter: TelemetryUrlFilter, tagger: Arc<dyn SpanTagger>) -> Self {
        Self {
            filter,
            response_fetcher: ResponseFetcher::new(),
            tagger,
        }
    }

    fn on_response(&self, response: &ResponseSnapshot) {
        if self.filter.is_telemetry_url(&response.request_uri) {
            return;
        }

        if let Some(values) = joined_header(&response.headers, ACTIVITY_ID_HEADER) {
            self.tagger.add_tag("Activity Id", values);
        }

        if let Some(values) = joined_header(&response.headers, REQUEST_CHARGE_HEADER) {
            self.tagger.add_tag("Request Charge", values);
        }
    }
}

impl EventObserver for HttpDiagnosticListener {
    fn on_event(&self, name: &str, payload: &Payload) {
        if name == HTTP_RESPONSE_EVENT {
            if let Some(response) = self.response_fetcher.fetch(payload) {
                self.on_response(response);
            }
        }
    }
}

/// All values of a (case-insensitive) header joined with ", ", or `None` if
/// the header is absent.
fn joined_header(headers: &HeaderMap, name: &str) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}
