//! Outbound-call telemetry interception.
//!
//! Outbound HTTP responses are observed through a process-wide diagnostic
//! event registry rather than at call sites: the instrumented client
//! publishes a completed-response event, and a single subscriber installed at
//! startup copies vendor response headers onto the active trace span.

mod client;
mod diagnostics;
mod listener;
mod payload;
mod subscriber;
mod url_filter;

pub use client::SiteHttpClient;
pub use diagnostics::{
    DiagnosticRegistry, DiagnosticSource, EventObserver, Payload, SourceObserver, Subscription,
};
pub use listener::{HttpDiagnosticListener, OtelSpanTagger, SpanTagger, HTTP_RESPONSE_EVENT};
pub use payload::{HttpExchange, ResponseFetcher, ResponseSnapshot};
pub use subscriber::{HttpDiagnosticSubscriber, HTTP_CLIENT_SOURCE};
pub use url_filter::TelemetryUrlFilter;
