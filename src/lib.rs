pub mod config;
pub mod dtos;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::SiteConfig;
use crate::error::AppError;
use crate::middleware::{admin_auth_middleware, request_id_middleware};
use crate::services::UserStore;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::api::get_preferences,
        handlers::api::get_count,
        handlers::health::health_check,
    ),
    components(schemas(
        dtos::PreferencesResponse,
        dtos::ErrorResponse,
        dtos::CountResponse,
        models::TravelUser,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "API", description = "Preferences for Alexa account-linked users"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .build(),
                ),
            );
            components.add_security_scheme(
                "admin_api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Admin-Api-Key"))),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: SiteConfig,
    pub users: Arc<dyn UserStore>,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let admin_routes = Router::new()
        .route("/api/_count", get(handlers::api::get_count))
        .layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    let mut app = Router::new()
        .route("/api/preferences", get(handlers::api::get_preferences))
        .merge(admin_routes)
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::get_metrics));

    if state.config.swagger.enabled {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    let origins: Vec<axum::http::HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    Ok(app
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(AllowOrigin::list(origins)))
        .with_state(state))
}
