use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Body returned by `GET /api/preferences` for an authorized token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: String,
    #[schema(example = json!(["district", "northern"]))]
    pub favorite_lines: Vec<String>,
}

/// Structured error body for API authorization failures.
///
/// `details` carries at most one entry, and only when the Authorization
/// header itself was syntactically invalid; the message stays deliberately
/// generic so failures do not reveal which validation step rejected the
/// credential.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    #[schema(example = "Unauthorized.")]
    pub message: String,
    #[schema(example = "8a9b0c1d-2e3f-4a5b-8c7d-6e5f4a3b2c1d")]
    pub request_id: String,
    #[schema(example = 401)]
    pub status_code: u16,
    pub details: Vec<String>,
}

/// Body returned by the admin-only `GET /api/_count`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CountResponse {
    #[schema(example = 9500)]
    pub count: u64,
}
