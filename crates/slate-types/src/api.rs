use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{LifecycleEvent, PostStatus};

// -- Users --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Accepted for wire compatibility but ignored; creation time is always
    /// stamped server-side.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// -- Media --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMediaRequest {
    pub filepath: String,
    #[serde(default)]
    pub caption: Option<String>,
    pub user_id: i64,
    pub format_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    pub user_id: Option<i64>,
}

// -- Platforms --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePlatformRequest {
    pub label: String,
}

// -- Placements --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulePlacementRequest {
    pub media_id: i64,
    pub platform_id: i64,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PlacementQuery {
    pub status: Option<PostStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvanceRequest {
    pub event: LifecycleEvent,
}

// -- Interactions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordInteractionRequest {
    pub interaction_type_id: i64,
}

// -- Meta --

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
