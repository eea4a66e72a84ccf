use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL,
            is_admin    INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS formats (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            label       TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS platforms (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            label       TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS interaction_types (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            label       TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS scheduled_times (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            at          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS media (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            filepath    TEXT NOT NULL,
            caption     TEXT,
            uploaded_at TEXT NOT NULL,
            user_id     INTEGER NOT NULL REFERENCES users(id),
            format_id   INTEGER NOT NULL REFERENCES formats(id)
        );

        CREATE INDEX IF NOT EXISTS idx_media_user
            ON media(user_id);

        CREATE TABLE IF NOT EXISTS placements (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            media_id          INTEGER NOT NULL REFERENCES media(id),
            platform_id       INTEGER NOT NULL REFERENCES platforms(id),
            scheduled_time_id INTEGER NOT NULL REFERENCES scheduled_times(id),
            status            TEXT NOT NULL DEFAULT 'scheduled',
            attempts          INTEGER NOT NULL DEFAULT 0,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL,
            UNIQUE(media_id, platform_id)
        );

        CREATE INDEX IF NOT EXISTS idx_placements_status
            ON placements(status, updated_at);

        CREATE TABLE IF NOT EXISTS media_interactions (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            interaction_type_id INTEGER NOT NULL REFERENCES interaction_types(id),
            placement_id        INTEGER NOT NULL REFERENCES placements(id),
            created_at          TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_placement
            ON media_interactions(placement_id);

        -- Seed the lookup tables
        INSERT OR IGNORE INTO formats (label) VALUES ('image'), ('video');
        INSERT OR IGNORE INTO interaction_types (label)
            VALUES ('like'), ('comment'), ('share');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
