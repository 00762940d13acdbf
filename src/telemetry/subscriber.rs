use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::diagnostics::{
    DiagnosticRegistry, DiagnosticSource, SourceObserver, Subscription,
};
use super::listener::{HttpDiagnosticListener, HTTP_RESPONSE_EVENT};

/// Name of the diagnostic source published by the instrumented HTTP client.
pub const HTTP_CLIENT_SOURCE: &str = "http-client";

/// Owns the single per-process subscription that wires the HTTP diagnostic
/// listener into the registry.
///
/// Installed once at startup and closed once at shutdown. Closing detaches
/// the registry subscription and the event subscription independently;
/// either may be absent (the source may never have appeared), and closing
/// again is a no-op.
pub struct HttpDiagnosticSubscriber {
    registry_subscription: Mutex<Option<Subscription>>,
    event_subscription: Arc<Mutex<Option<Subscription>>>,
    closed: AtomicBool,
}

impl HttpDiagnosticSubscriber {
    pub fn subscribe(
        registry: &Arc<DiagnosticRegistry>,
        listener: Arc<HttpDiagnosticListener>,
    ) -> Self {
        let event_subscription = Arc::new(Mutex::new(None));

        let observer = Arc::new(HttpSourceObserver {
            listener,
            event_subscription: Arc::clone(&event_subscription),
        });
        let registry_subscription = registry.observe_sources(observer);

        Self {
            registry_subscription: Mutex::new(Some(registry_subscription)),
            event_subscription,
            closed: AtomicBool::new(false),
        }
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Some(subscription) = lock(&self.registry_subscription).take() {
            subscription.close();
        }

        if let Some(subscription) = lock(&self.event_subscription).take() {
            subscription.close();
        }
    }
}

impl Drop for HttpDiagnosticSubscriber {
    fn drop(&mut self) {
        self.close();
    }
}

struct HttpSourceObserver {
    listener: Arc<HttpDiagnosticListener>,
    event_subscription: Arc<Mutex<Option<Subscription>>>,
}

impl SourceObserver for HttpSourceObserver {
    fn on_source(&self, source: &Arc<DiagnosticSource>) {
        if source.name() == HTTP_CLIENT_SOURCE {
            let subscription = source.subscribe(
                Some(Box::new(|name| name == HTTP_RESPONSE_EVENT)),
                Arc::clone(&self.listener) as _,
            );
            *lock(&self.event_subscription) = Some(subscription);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::url_filter::TelemetryUrlFilter;

    fn listener() -> Arc<HttpDiagnosticListener> {
        use crate::telemetry::listener::OtelSpanTagger;
        Arc::new(HttpDiagnosticListener::new(
            TelemetryUrlFilter::new(Vec::new()),
            Arc::new(OtelSpanTagger),
        ))
    }

    #[test]
    fn subscribes_to_the_http_client_source_when_it_appears() {
        let registry = DiagnosticRegistry::new();
        let subscriber = HttpDiagnosticSubscriber::subscribe(&registry, listener());

        let source = registry.source(HTTP_CLIENT_SOURCE);
        assert!(source.is_enabled());

        subscriber.close();
        assert!(!source.is_enabled());
    }

    #[test]
    fn ignores_unrelated_sources() {
        let registry = DiagnosticRegistry::new();
        let _subscriber = HttpDiagnosticSubscriber::subscribe(&registry, listener());

        let source = registry.source("database");
        assert!(!source.is_enabled());
    }

    #[test]
    fn finds_a_source_registered_before_subscribing() {
        let registry = DiagnosticRegistry::new();
        let source = registry.source(HTTP_CLIENT_SOURCE);

        let _subscriber = HttpDiagnosticSubscriber::subscribe(&registry, listener());
        assert!(source.is_enabled());
    }

    #[test]
    fn closing_twice_is_a_no_op() {
        let registry = DiagnosticRegistry::new();
        let subscriber = HttpDiagnosticSubscriber::subscribe(&registry, listener());
        registry.source(HTTP_CLIENT_SOURCE);

        subscriber.close();
        subscriber.close();
    }

    #[test]
    fn closing_before_the_source_appears_is_safe() {
        let registry = DiagnosticRegistry::new();
        let subscriber = HttpDiagnosticSubscriber::subscribe(&registry, listener());

        subscriber.close();

        // The observer is detached, so a late source gets no subscription.
        let source = registry.source(HTTP_CLIENT_SOURCE);
        assert!(!source.is_enabled());
    }
}
