use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

// Metrics
pub static API_PREFERENCES_UNAUTHORIZED: OnceLock<IntCounter> = OnceLock::new();
pub static API_PREFERENCES_SUCCESS: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    let registry = Registry::new();

    let unauthorized = match IntCounter::with_opts(Opts::new(
        "api_preferences_unauthorized_total",
        "Total number of rejected preferences API requests",
    )) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create api_preferences_unauthorized_total metric: {}", e);
            panic!("Failed to initialize metrics: {}", e);
        }
    };

    let success = match IntCounterVec::new(
        Opts::new(
            "api_preferences_success_total",
            "Total number of authorized preferences API requests",
        ),
        &["user_id"],
    ) {
        Ok(metric) => metric,
        Err(e) => {
            tracing::error!("Failed to create api_preferences_success_total metric: {}", e);
            panic!("Failed to initialize metrics: {}", e);
        }
    };

    if let Err(e) = registry.register(Box::new(unauthorized.clone())) {
        tracing::error!("Failed to register api_preferences_unauthorized_total collector: {}", e);
        panic!("Failed to initialize metrics: {}", e);
    }

    if let Err(e) = registry.register(Box::new(success.clone())) {
        tracing::error!("Failed to register api_preferences_success_total collector: {}", e);
        panic!("Failed to initialize metrics: {}", e);
    }

    // Initialize globals
    let _ = REGISTRY.set(registry);
    let _ = API_PREFERENCES_UNAUTHORIZED.set(unauthorized);
    let _ = API_PREFERENCES_SUCCESS.set(success);
}

/// Count a rejected preferences request.
pub fn track_api_preferences_unauthorized() {
    if let Some(counter) = API_PREFERENCES_UNAUTHORIZED.get() {
        counter.inc();
    }
}

/// Count an authorized preferences request for the given user.
pub fn track_api_preferences_success(user_id: &str) {
    if let Some(counter) = API_PREFERENCES_SUCCESS.get() {
        counter.with_label_values(&[user_id]).inc();
    }
}

pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match REGISTRY.get() {
        Some(r) => r,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to convert metrics to UTF-8: {}", e);
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}
