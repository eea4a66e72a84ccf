use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::PostStatus;

/// An account holder. The password hash never leaves slate-db; this is the
/// public projection served over the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// An uploaded asset, owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub filepath: String,
    pub caption: Option<String>,
    pub uploaded_at: DateTime<Utc>,
    pub user_id: i64,
    pub format_id: i64,
}

/// Medium type, e.g. image or video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Format {
    pub id: i64,
    pub label: String,
}

/// A destination network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: i64,
    pub label: String,
}

/// A category of reaction, e.g. like or comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionType {
    pub id: i64,
    pub label: String,
}

/// One media item's deployment attempt on one platform, carrying its own
/// lifecycle status. The scheduled time attaches here rather than to the
/// media item: scheduling is per destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub id: i64,
    pub media_id: i64,
    pub platform_id: i64,
    pub status: PostStatus,
    pub scheduled_at: DateTime<Utc>,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recorded reaction against a posted placement. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInteraction {
    pub id: i64,
    pub interaction_type_id: i64,
    pub placement_id: i64,
    pub created_at: DateTime<Utc>,
}
