//! Outbound HTTP client with trace propagation and diagnostic publication.
//!
//! Adapted from the W3C trace-context helpers used for service-to-service
//! calls: every request carries a `traceparent` header, and every completed
//! response is published as a diagnostic event so the process-wide listener
//! can enrich the active span without this module knowing about it.

use std::sync::Arc;

use opentelemetry::trace::TraceContextExt;
use reqwest::header::HeaderMap;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::diagnostics::{DiagnosticRegistry, DiagnosticSource};
use super::listener::HTTP_RESPONSE_EVENT;
use super::payload::{HttpExchange, ResponseSnapshot};
use super::subscriber::HTTP_CLIENT_SOURCE;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Inject the current trace context into outbound request headers as a W3C
/// `traceparent` header. A request made outside any span gets no header.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    let span = Span::current();
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();

    if span_context.is_valid() {
        // Format: version-trace_id-span_id-trace_flags; version is "00".
        let traceparent = format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        );

        if let Ok(value) = traceparent.parse() {
            headers.insert(TRACEPARENT_HEADER, value);
        }
    }
}

/// HTTP client for the site's outbound calls (line status, account linking
/// callbacks). Wraps `reqwest` so call sites need no telemetry knowledge.
#[derive(Clone)]
pub struct SiteHttpClient {
    client: reqwest::Client,
    source: Arc<DiagnosticSource>,
}

impl SiteHttpClient {
    pub fn new(registry: &DiagnosticRegistry) -> Self {
        Self {
            client: reqwest::Client::new(),
            source: registry.source(HTTP_CLIENT_SOURCE),
        }
    }

    pub async fn get(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.execute(self.client.get(url)).await
    }

    pub async fn post(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.execute(self.client.post(url)).await
    }

    /// Send a prepared request with trace context injected, publishing a
    /// completed-response diagnostic event on success.
    pub async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);

        let response = request.headers(headers).send().await?;
        self.publish(&response);
        Ok(response)
    }

    fn publish(&self, response: &reqwest::Response) {
        if !self.source.is_enabled() {
            return;
        }

        let payload = HttpExchange {
            response: ResponseSnapshot {
                request_uri: response.url().clone(),
                status: response.status(),
                headers: response.headers().clone(),
            },
        };

        self.source.emit(HTTP_RESPONSE_EVENT, &payload);
    }
}
