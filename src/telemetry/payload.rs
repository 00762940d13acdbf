use std::sync::OnceLock;

use http::{HeaderMap, StatusCode};
use url::Url;

use super::diagnostics::Payload;

/// What the interceptor needs to know about a completed outbound exchange:
/// where the request went and what came back.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    pub request_uri: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Event payload published by the instrumented HTTP client. The field layout
/// belongs to the client layer and may grow across versions; consumers go
/// through [`ResponseFetcher`] instead of matching on it directly.
#[derive(Debug, Clone)]
pub struct HttpExchange {
    pub response: ResponseSnapshot,
}

type Adapter = fn(&Payload) -> Option<&ResponseSnapshot>;

fn exchange_adapter(payload: &Payload) -> Option<&ResponseSnapshot> {
    payload.downcast_ref::<HttpExchange>().map(|e| &e.response)
}

fn snapshot_adapter(payload: &Payload) -> Option<&ResponseSnapshot> {
    payload.downcast_ref::<ResponseSnapshot>()
}

/// Pulls the response out of an untyped event payload.
///
/// The concrete payload type is an implementation detail of the HTTP client
/// layer, so extraction goes through a registry of typed adapters, one per
/// known payload shape. The adapter that recognises the first payload is
/// memoized for the lifetime of the fetcher; if no adapter matches, the
/// fetcher yields nothing from then on rather than erroring. The memoization
/// may race, in which case the winner is recorded and losers recomputed
/// harmlessly.
pub struct ResponseFetcher {
    adapters: &'static [Adapter],
    resolved: OnceLock<Option<usize>>,
}

impl ResponseFetcher {
    pub fn new() -> Self {
        Self {
            adapters: &[exchange_adapter, snapshot_adapter],
            resolved: OnceLock::new(),
        }
    }

    pub fn fetch<'a>(&self, payload: &'a Payload) -> Option<&'a ResponseSnapshot> {
        let resolved = self
            .resolved
            .get_or_init(|| self.adapters.iter().position(|a| a(payload).is_some()));

        resolved.and_then(|index| self.adapters[index](payload))
    }
}

impl Default for ResponseFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(uri: &str) -> ResponseSnapshot {
        ResponseSnapshot {
            request_uri: Url::parse(uri).unwrap(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn fetches_response_from_exchange_payload() {
        let fetcher = ResponseFetcher::new();
        let payload = HttpExchange {
            response: snapshot("https://api.tfl.gov.uk/Line/Mode/tube/Status"),
        };

        let response = fetcher.fetch(&payload).expect("response should be found");
        assert_eq!(response.request_uri.host_str(), Some("api.tfl.gov.uk"));
    }

    #[test]
    fn fetches_bare_snapshot_payload() {
        let fetcher = ResponseFetcher::new();
        let payload = snapshot("https://example.org/");

        assert!(fetcher.fetch(&payload).is_some());
    }

    #[test]
    fn unknown_payload_shape_yields_nothing_and_is_memoized() {
        let fetcher = ResponseFetcher::new();

        assert!(fetcher.fetch(&"not an exchange").is_none());

        // The first shape seen decided the adapter; a later well-formed
        // payload is still ignored, mirroring one-shot memoization.
        let payload = HttpExchange {
            response: snapshot("https://example.org/"),
        };
        assert!(fetcher.fetch(&payload).is_none());
    }
}
