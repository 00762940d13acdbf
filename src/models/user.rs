use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A London Travel account as stored in the user directory.
///
/// `favorite_lines` is semantically a set of line identifiers but insertion
/// order is preserved so the Alexa skill reads lines back in the order the
/// user picked them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TravelUser {
    pub user_id: Uuid,
    pub favorite_lines: Vec<String>,
    /// Access token issued during Alexa account linking, if the user has
    /// linked the skill. Matched ordinally against presented bearer tokens.
    pub alexa_token: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl TravelUser {
    pub fn new(favorite_lines: Vec<String>, alexa_token: Option<String>) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            favorite_lines,
            alexa_token,
            created_utc: Utc::now(),
        }
    }
}
