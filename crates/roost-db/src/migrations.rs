use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL,
            password    TEXT NOT NULL,
            photo       TEXT,
            premium     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_users_premium
            ON users(premium);

        -- owner_id is nullable for legacy rows; new listings always carry one.
        CREATE TABLE IF NOT EXISTS items (
            id              TEXT PRIMARY KEY,
            owner_id        TEXT,
            name            TEXT,
            title           TEXT,
            description     TEXT,
            price           REAL NOT NULL,
            address         TEXT NOT NULL,
            city            TEXT NOT NULL,
            country         TEXT NOT NULL,
            rooms           INTEGER,
            bedrooms        INTEGER,
            area            REAL,
            floor           INTEGER,
            annex_area      REAL,
            type_of_housing TEXT,
            exposure        TEXT,
            furnished       INTEGER,
            accessibility   INTEGER,
            latitude        REAL,
            longitude       REAL,
            images          TEXT NOT NULL DEFAULT '[]',
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_items_owner
            ON items(owner_id);

        CREATE INDEX IF NOT EXISTS idx_items_created
            ON items(created_at);

        CREATE TABLE IF NOT EXISTS item_likes (
            item_id     TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (item_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS dossiers (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL,
            item_id     TEXT,
            url         TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_dossiers_user
            ON dossiers(user_id);

        CREATE TABLE IF NOT EXISTS dossier_owners (
            dossier_id   TEXT NOT NULL REFERENCES dossiers(id) ON DELETE CASCADE,
            owner_id     TEXT NOT NULL,
            position     INTEGER NOT NULL,
            is_validated INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (dossier_id, owner_id)
        );

        CREATE INDEX IF NOT EXISTS idx_dossier_owners_owner
            ON dossier_owners(owner_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
