//! Handlers for the `/api` resource.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::{
    dtos::{CountResponse, ErrorResponse, PreferencesResponse},
    error::AppError,
    middleware::RequestId,
    models::TravelUser,
    services::metrics,
    AppState,
};

const INVALID_AUTHORIZATION_VALUE: &str = "The provided authorization value is not valid.";
const UNSUPPORTED_AUTHORIZATION_SCHEME: &str =
    "Only the bearer authorization scheme is supported.";

/// Gets the preferences for the user associated with an Alexa access token.
#[utoipa::path(
    get,
    path = "/api/preferences",
    tag = "API",
    responses(
        (status = 200, description = "The preferences associated with the provided access token", body = PreferencesResponse),
        (status = 401, description = "A valid access token was not provided", body = ErrorResponse),
        (status = 500, description = "An internal error occurred"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    tracing::trace!("Received API request for user preferences");

    let remote_ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if authorization.trim().is_empty() {
        tracing::info!(
            remote_ip = %remote_ip,
            user_agent = %user_agent,
            "API request for preferences denied as no Authorization header/value was specified"
        );

        metrics::track_api_preferences_unauthorized();

        return Ok(unauthorized(
            &request_id,
            "No access token specified.",
            None,
        ));
    }

    let (access_token, error_detail) = access_token_from_header(authorization);

    let mut user = None;

    if let Some(token) = access_token {
        user = find_user_by_access_token(&state, token).await?;
    }

    let user = match user {
        Some(user) if token_matches(&user, access_token) => user,
        _ => {
            tracing::info!(
                remote_ip = %remote_ip,
                user_agent = %user_agent,
                "API request for preferences denied as the specified access token is unknown"
            );

            metrics::track_api_preferences_unauthorized();

            return Ok(unauthorized(&request_id, "Unauthorized.", error_detail));
        }
    };

    tracing::info!(
        user_id = %user.user_id,
        remote_ip = %remote_ip,
        user_agent = %user_agent,
        "Successfully authorized API request for preferences"
    );

    let data = PreferencesResponse {
        user_id: user.user_id.to_string(),
        favorite_lines: user.favorite_lines,
    };

    metrics::track_api_preferences_success(&data.user_id);

    Ok(Json(data).into_response())
}

/// Gets the number of registered users. Admin only.
#[utoipa::path(
    get,
    path = "/api/_count",
    tag = "API",
    responses(
        (status = 200, description = "The number of registered users", body = CountResponse),
        (status = 401, description = "Invalid or missing admin API key"),
    ),
    security(("admin_api_key" = []))
)]
pub async fn get_count(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.users.count().await?;
    Ok(Json(CountResponse { count }))
}

/// Extracts the Alexa access token from an Authorization header value,
/// or an error detail describing why no token could be read.
///
/// The header must parse as a `Scheme Parameter` pair with the `bearer`
/// scheme. The parameter itself gets no further syntactic validation; an
/// unknown token is indistinguishable from a malformed one at this level.
fn access_token_from_header(value: &str) -> (Option<&str>, Option<&'static str>) {
    let trimmed = value.trim();

    let (scheme, parameter) = match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) => {
            let rest = rest.trim();
            (scheme, if rest.is_empty() { None } else { Some(rest) })
        }
        None => (trimmed, None),
    };

    if scheme.is_empty() || !scheme.chars().all(is_tchar) {
        return (None, Some(INVALID_AUTHORIZATION_VALUE));
    }

    // More than one parameter is not a credential.
    if parameter.is_some_and(|p| p.chars().any(char::is_whitespace)) {
        return (None, Some(INVALID_AUTHORIZATION_VALUE));
    }

    if !scheme.eq_ignore_ascii_case("bearer") {
        return (None, Some(UNSUPPORTED_AUTHORIZATION_SCHEME));
    }

    (parameter, None)
}

fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

/// Whether the found user's stored token is ordinally equal to the presented
/// one. The lookup already filtered on equality; this re-check guards against
/// a store that matches more loosely and against mutation between lookup and
/// comparison.
fn token_matches(user: &TravelUser, presented: Option<&str>) -> bool {
    match (user.alexa_token.as_deref(), presented) {
        (Some(stored), Some(presented)) => stored == presented,
        _ => false,
    }
}

/// Finds the user linked to the access token. A store failure is logged here
/// once and propagated; a data-layer outage must surface as a server error,
/// not an authorization failure.
async fn find_user_by_access_token(
    state: &AppState,
    access_token: &str,
) -> Result<Option<TravelUser>, AppError> {
    if access_token.is_empty() {
        return Ok(None);
    }

    match state.users.find_by_alexa_token(access_token).await {
        Ok(user) => Ok(user),
        Err(e) => {
            tracing::error!(error = %e, "Failed to find user by access token");
            Err(e)
        }
    }
}

fn unauthorized(request_id: &str, message: &str, detail: Option<&str>) -> Response {
    let error = ErrorResponse {
        message: message.to_string(),
        request_id: request_id.to_string(),
        status_code: StatusCode::UNAUTHORIZED.as_u16(),
        details: detail.map(|d| vec![d.to_string()]).unwrap_or_default(),
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}
