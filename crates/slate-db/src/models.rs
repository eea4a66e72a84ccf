//! Database row types — these map directly to SQLite rows.
//! Distinct from the slate-types API models so the wire surface never
//! accidentally grows a password column.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use slate_types::models::{MediaInteraction, MediaItem, Placement, User};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub email: String,
    pub created_at: String,
    pub is_admin: bool,
}

impl UserRow {
    /// Public projection; drops the password hash.
    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            is_admin: self.is_admin,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

pub struct MediaRow {
    pub id: i64,
    pub filepath: String,
    pub caption: Option<String>,
    pub uploaded_at: String,
    pub user_id: i64,
    pub format_id: i64,
}

impl MediaRow {
    pub fn into_media(self) -> Result<MediaItem> {
        Ok(MediaItem {
            id: self.id,
            filepath: self.filepath,
            caption: self.caption,
            uploaded_at: parse_ts(&self.uploaded_at)?,
            user_id: self.user_id,
            format_id: self.format_id,
        })
    }
}

pub struct PlacementRow {
    pub id: i64,
    pub media_id: i64,
    pub platform_id: i64,
    pub status: String,
    pub scheduled_at: String,
    pub attempts: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl PlacementRow {
    pub fn into_placement(self) -> Result<Placement> {
        Ok(Placement {
            id: self.id,
            media_id: self.media_id,
            platform_id: self.platform_id,
            status: self
                .status
                .parse()
                .with_context(|| format!("placement {} has corrupt status", self.id))?,
            scheduled_at: parse_ts(&self.scheduled_at)?,
            attempts: self.attempts,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

pub struct InteractionRow {
    pub id: i64,
    pub interaction_type_id: i64,
    pub placement_id: i64,
    pub created_at: String,
}

impl InteractionRow {
    pub fn into_interaction(self) -> Result<MediaInteraction> {
        Ok(MediaInteraction {
            id: self.id,
            interaction_type_id: self.interaction_type_id,
            placement_id: self.placement_id,
            created_at: parse_ts(&self.created_at)?,
        })
    }
}

/// Fixed-width UTC timestamp. Microsecond precision keeps lexicographic
/// comparison in SQL consistent with chronological order.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') format has no timezone; treat as UTC.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("corrupt timestamp '{}'", raw))
}
