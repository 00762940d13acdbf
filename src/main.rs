use std::net::SocketAddr;
use std::sync::Arc;

use london_travel_site::{
    build_router,
    config::SiteConfig,
    error::AppError,
    observability::logging::init_tracing,
    services::{metrics, PgUserStore},
    telemetry::{
        DiagnosticRegistry, HttpDiagnosticListener, HttpDiagnosticSubscriber, OtelSpanTagger,
        TelemetryUrlFilter,
    },
    AppState,
};
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = SiteConfig::from_env()?;

    init_tracing(&config);
    metrics::init_metrics();

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting London Travel site API"
    );

    let users = PgUserStore::connect(&config.database).await?;
    users.run_migrations().await?;
    users.health_check().await?;
    tracing::info!("Database initialized successfully");

    // Wire up outbound-call interception: one registry, one subscriber, both
    // torn down when the server loop exits.
    let diagnostics = DiagnosticRegistry::new();
    let listener = Arc::new(HttpDiagnosticListener::new(
        TelemetryUrlFilter::new(config.telemetry.ingestion_hosts.clone()),
        Arc::new(OtelSpanTagger),
    ));
    let http_subscriber = HttpDiagnosticSubscriber::subscribe(&diagnostics, listener);
    tracing::info!("HTTP diagnostics subscriber installed");

    let state = AppState {
        config: config.clone(),
        users: Arc::new(users),
    };

    let app = build_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!(address = %addr, "Listening");

    let listener_socket = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener_socket,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    http_subscriber.close();
    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
