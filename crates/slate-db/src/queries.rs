use chrono::{DateTime, Utc};
use rusqlite::Connection;

use anyhow::{Result, anyhow};
use slate_types::models::{Format, InteractionType, MediaInteraction, MediaItem, Placement, Platform, User};
use slate_types::status::PostStatus;

use crate::Database;
use crate::models::{InteractionRow, MediaRow, PlacementRow, UserRow, fmt_ts};

impl Database {
    // -- Users --

    /// Returns `None` when the UNIQUE constraint on username or email fires,
    /// so a duplicate that slips past the pre-check still surfaces as a
    /// rejection rather than an opaque persistence failure.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: &str,
        is_admin: bool,
    ) -> Result<Option<User>> {
        let created_at = fmt_ts(Utc::now());
        self.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password, email, created_at, is_admin)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![username, password_hash, email, &created_at, is_admin],
            ) {
                Ok(_) => {}
                Err(e) if is_constraint_violation(&e) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
            let id = conn.last_insert_rowid();
            let user = query_user_by_id(conn, id)?
                .ok_or_else(|| anyhow!("user {} vanished after insert", id))?;
            Ok(Some(user))
        })
    }

    /// Uniqueness pre-check for registration: true if the username or the
    /// email is already taken.
    pub fn user_exists(&self, username: &str, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
                rusqlite::params![username, email],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// All users, password column excluded from the projection.
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, password, email, created_at, is_admin
                 FROM users ORDER BY id",
            )?;
            let rows = stmt
                .query_map([], map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(UserRow::into_user).collect()
        })
    }

    // -- Lookup tables --

    pub fn list_formats(&self) -> Result<Vec<Format>> {
        self.with_conn(|conn| query_labels(conn, "formats").map(|rows| {
            rows.into_iter()
                .map(|(id, label)| Format { id, label })
                .collect()
        }))
    }

    pub fn get_format(&self, id: i64) -> Result<Option<Format>> {
        self.with_conn(|conn| {
            Ok(query_label_by_id(conn, "formats", id)?
                .map(|label| Format { id, label }))
        })
    }

    pub fn create_platform(&self, label: &str) -> Result<Platform> {
        self.with_conn_mut(|conn| {
            conn.execute("INSERT INTO platforms (label) VALUES (?1)", [label])?;
            Ok(Platform {
                id: conn.last_insert_rowid(),
                label: label.to_string(),
            })
        })
    }

    pub fn platform_exists(&self, label: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM platforms WHERE label = ?1",
                [label],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn list_platforms(&self) -> Result<Vec<Platform>> {
        self.with_conn(|conn| query_labels(conn, "platforms").map(|rows| {
            rows.into_iter()
                .map(|(id, label)| Platform { id, label })
                .collect()
        }))
    }

    pub fn get_platform(&self, id: i64) -> Result<Option<Platform>> {
        self.with_conn(|conn| {
            Ok(query_label_by_id(conn, "platforms", id)?
                .map(|label| Platform { id, label }))
        })
    }

    pub fn list_interaction_types(&self) -> Result<Vec<InteractionType>> {
        self.with_conn(|conn| query_labels(conn, "interaction_types").map(|rows| {
            rows.into_iter()
                .map(|(id, label)| InteractionType { id, label })
                .collect()
        }))
    }

    pub fn get_interaction_type(&self, id: i64) -> Result<Option<InteractionType>> {
        self.with_conn(|conn| {
            Ok(query_label_by_id(conn, "interaction_types", id)?
                .map(|label| InteractionType { id, label }))
        })
    }

    // -- Media --

    pub fn create_media(
        &self,
        filepath: &str,
        caption: Option<&str>,
        user_id: i64,
        format_id: i64,
    ) -> Result<MediaItem> {
        let uploaded_at = fmt_ts(Utc::now());
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO media (filepath, caption, uploaded_at, user_id, format_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![filepath, caption, &uploaded_at, user_id, format_id],
            )?;
            let id = conn.last_insert_rowid();
            query_media_by_id(conn, id)?
                .ok_or_else(|| anyhow!("media {} vanished after insert", id))
        })
    }

    pub fn get_media(&self, id: i64) -> Result<Option<MediaItem>> {
        self.with_conn(|conn| query_media_by_id(conn, id))
    }

    pub fn list_media(&self, user_id: Option<i64>) -> Result<Vec<MediaItem>> {
        self.with_conn(|conn| {
            let mut stmt = match user_id {
                Some(_) => conn.prepare(
                    "SELECT id, filepath, caption, uploaded_at, user_id, format_id
                     FROM media WHERE user_id = ?1 ORDER BY id",
                )?,
                None => conn.prepare(
                    "SELECT id, filepath, caption, uploaded_at, user_id, format_id
                     FROM media ORDER BY id",
                )?,
            };
            let rows = match user_id {
                Some(uid) => stmt.query_map([uid], map_media_row)?,
                None => stmt.query_map([], map_media_row)?,
            }
            .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(MediaRow::into_media).collect()
        })
    }

    // -- Placements --

    /// Insert the scheduled time and the placement together; the connection
    /// mutex serializes writers, so the pair is never observed half-written.
    /// Returns `None` when the UNIQUE (media, platform) constraint fires.
    pub fn schedule_placement(
        &self,
        media_id: i64,
        platform_id: i64,
        scheduled_at: DateTime<Utc>,
    ) -> Result<Option<Placement>> {
        let now = fmt_ts(Utc::now());
        let at = fmt_ts(scheduled_at);
        self.with_conn_mut(|conn| {
            conn.execute("INSERT INTO scheduled_times (at) VALUES (?1)", [&at])?;
            let scheduled_time_id = conn.last_insert_rowid();

            match conn.execute(
                "INSERT INTO placements
                     (media_id, platform_id, scheduled_time_id, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![
                    media_id,
                    platform_id,
                    scheduled_time_id,
                    PostStatus::Scheduled.as_str(),
                    &now,
                ],
            ) {
                Ok(_) => {}
                Err(e) if is_constraint_violation(&e) => {
                    // Don't leave the scheduled time orphaned.
                    conn.execute(
                        "DELETE FROM scheduled_times WHERE id = ?1",
                        [scheduled_time_id],
                    )?;
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
            let id = conn.last_insert_rowid();
            let placement = query_placement_by_id(conn, id)?
                .ok_or_else(|| anyhow!("placement {} vanished after insert", id))?;
            Ok(Some(placement))
        })
    }

    pub fn get_placement(&self, id: i64) -> Result<Option<Placement>> {
        self.with_conn(|conn| query_placement_by_id(conn, id))
    }

    pub fn get_placement_for_pair(
        &self,
        media_id: i64,
        platform_id: i64,
    ) -> Result<Option<Placement>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{PLACEMENT_SELECT} WHERE p.media_id = ?1 AND p.platform_id = ?2"
            ))?;
            let row = stmt
                .query_row(rusqlite::params![media_id, platform_id], map_placement_row)
                .optional()?;
            row.map(PlacementRow::into_placement).transpose()
        })
    }

    pub fn list_placements(&self, status: Option<PostStatus>) -> Result<Vec<Placement>> {
        self.with_conn(|conn| {
            let rows = match status {
                Some(status) => {
                    let mut stmt = conn.prepare(&format!(
                        "{PLACEMENT_SELECT} WHERE p.status = ?1 ORDER BY p.id"
                    ))?;
                    let rows = stmt
                        .query_map([status.as_str()], map_placement_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
                None => {
                    let mut stmt =
                        conn.prepare(&format!("{PLACEMENT_SELECT} ORDER BY p.id"))?;
                    let rows = stmt
                        .query_map([], map_placement_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
            };
            rows.into_iter().map(PlacementRow::into_placement).collect()
        })
    }

    /// Optimistic status update: the write only lands if the row is still in
    /// `from`. Returns false when a concurrent transition won the race.
    pub fn update_placement_status(
        &self,
        id: i64,
        from: PostStatus,
        to: PostStatus,
        bump_attempt: bool,
    ) -> Result<bool> {
        let now = fmt_ts(Utc::now());
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE placements
                 SET status = ?2, attempts = attempts + ?3, updated_at = ?4
                 WHERE id = ?1 AND status = ?5",
                rusqlite::params![
                    id,
                    to.as_str(),
                    if bump_attempt { 1 } else { 0 },
                    &now,
                    from.as_str(),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    /// Scheduled placements whose scheduled time has passed.
    pub fn due_placements(&self, now: DateTime<Utc>) -> Result<Vec<Placement>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{PLACEMENT_SELECT} WHERE p.status = 'scheduled' AND s.at <= ?1 ORDER BY s.at"
            ))?;
            let rows = stmt
                .query_map([fmt_ts(now)], map_placement_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(PlacementRow::into_placement).collect()
        })
    }

    /// Submitted placements with no status change since `cutoff` — the
    /// submission attempt is considered timed out.
    pub fn stale_submissions(&self, cutoff: DateTime<Utc>) -> Result<Vec<Placement>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{PLACEMENT_SELECT} WHERE p.status = 'submitted' AND p.updated_at < ?1
                 ORDER BY p.updated_at"
            ))?;
            let rows = stmt
                .query_map([fmt_ts(cutoff)], map_placement_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(PlacementRow::into_placement).collect()
        })
    }

    /// Failed placements still under the attempt budget.
    pub fn retryable_placements(&self, max_attempts: i64) -> Result<Vec<Placement>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{PLACEMENT_SELECT} WHERE p.status = 'failed' AND p.attempts < ?1
                 ORDER BY p.updated_at"
            ))?;
            let rows = stmt
                .query_map([max_attempts], map_placement_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(PlacementRow::into_placement).collect()
        })
    }

    // -- Interactions --

    pub fn insert_interaction(
        &self,
        placement_id: i64,
        interaction_type_id: i64,
    ) -> Result<MediaInteraction> {
        let created_at = fmt_ts(Utc::now());
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO media_interactions (interaction_type_id, placement_id, created_at)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![interaction_type_id, placement_id, &created_at],
            )?;
            let id = conn.last_insert_rowid();
            let row = conn.query_row(
                "SELECT id, interaction_type_id, placement_id, created_at
                 FROM media_interactions WHERE id = ?1",
                [id],
                map_interaction_row,
            )?;
            row.into_interaction()
        })
    }

    pub fn list_interactions(&self, placement_id: i64) -> Result<Vec<MediaInteraction>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, interaction_type_id, placement_id, created_at
                 FROM media_interactions WHERE placement_id = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([placement_id], map_interaction_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter()
                .map(InteractionRow::into_interaction)
                .collect()
        })
    }
}

const PLACEMENT_SELECT: &str =
    "SELECT p.id, p.media_id, p.platform_id, p.status, s.at, p.attempts,
            p.created_at, p.updated_at
     FROM placements p
     JOIN scheduled_times s ON p.scheduled_time_id = s.id";

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        email: row.get(3)?,
        created_at: row.get(4)?,
        is_admin: row.get(5)?,
    })
}

fn map_media_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaRow> {
    Ok(MediaRow {
        id: row.get(0)?,
        filepath: row.get(1)?,
        caption: row.get(2)?,
        uploaded_at: row.get(3)?,
        user_id: row.get(4)?,
        format_id: row.get(5)?,
    })
}

fn map_placement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PlacementRow> {
    Ok(PlacementRow {
        id: row.get(0)?,
        media_id: row.get(1)?,
        platform_id: row.get(2)?,
        status: row.get(3)?,
        scheduled_at: row.get(4)?,
        attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn map_interaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InteractionRow> {
    Ok(InteractionRow {
        id: row.get(0)?,
        interaction_type_id: row.get(1)?,
        placement_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, email, created_at, is_admin
         FROM users WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], map_user_row).optional()?;
    row.map(UserRow::into_user).transpose()
}

fn query_media_by_id(conn: &Connection, id: i64) -> Result<Option<MediaItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, filepath, caption, uploaded_at, user_id, format_id
         FROM media WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], map_media_row).optional()?;
    row.map(MediaRow::into_media).transpose()
}

fn query_placement_by_id(conn: &Connection, id: i64) -> Result<Option<Placement>> {
    let mut stmt = conn.prepare(&format!("{PLACEMENT_SELECT} WHERE p.id = ?1"))?;
    let row = stmt.query_row([id], map_placement_row).optional()?;
    row.map(PlacementRow::into_placement).transpose()
}

fn query_labels(conn: &Connection, table: &str) -> Result<Vec<(i64, String)>> {
    let mut stmt = conn.prepare(&format!("SELECT id, label FROM {table} ORDER BY id"))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_label_by_id(conn: &Connection, table: &str, id: i64) -> Result<Option<String>> {
    let mut stmt = conn.prepare(&format!("SELECT label FROM {table} WHERE id = ?1"))?;
    let row = stmt.query_row([id], |row| row.get(0)).optional()?;
    Ok(row)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
