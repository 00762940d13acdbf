use url::Url;

/// Decides whether an outbound call targets the telemetry backend itself.
/// Such calls are never enriched, otherwise exporting a span would produce
/// another traced call and feed back into the trace stream.
pub struct TelemetryUrlFilter {
    hosts: Vec<String>,
}

impl TelemetryUrlFilter {
    pub fn new(hosts: impl IntoIterator<Item = String>) -> Self {
        Self {
            hosts: hosts.into_iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    pub fn is_telemetry_url(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => {
                let host = host.to_ascii_lowercase();
                self.hosts.iter().any(|h| *h == host)
            }
            None => false,
        }
    }
}
