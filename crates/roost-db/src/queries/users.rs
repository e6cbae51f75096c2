use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::Database;
use crate::models::UserRow;

const USER_COLUMNS: &str = "id, username, email, password, photo, premium, created_at";

impl Database {
    /// Insert a new account. The UNIQUE constraint on `username` surfaces as
    /// an error recognised by [`crate::is_unique_violation`].
    pub fn create_user(&self, user: &UserRow) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, photo, premium)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![user.id, user.username, user.email, user.password, user.photo, user.premium],
            )?;
            query_user(conn, "id", &user.id)?
                .ok_or_else(|| anyhow::anyhow!("user {} vanished after insert", user.id))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| query_users(conn, false))
    }

    pub fn list_premium_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| query_users(conn, true))
    }

    /// Overwrite every mutable column. Returns false when the id is unknown.
    pub fn update_user(&self, user: &UserRow) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET username = ?2, email = ?3, password = ?4, photo = ?5, premium = ?6
                 WHERE id = ?1",
                params![user.id, user.username, user.email, user.password, user.photo, user.premium],
            )?;
            Ok(n > 0)
        })
    }

    pub fn set_premium(&self, id: &str, premium: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET premium = ?2 WHERE id = ?1",
                params![id, premium],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        photo: row.get(4)?,
        premium: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// `column` is always one of our own literals, never user input.
fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
    let row = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(row)
}

fn query_users(conn: &Connection, premium_only: bool) -> Result<Vec<UserRow>> {
    let sql = if premium_only {
        format!("SELECT {} FROM users WHERE premium = 1 ORDER BY created_at, rowid", USER_COLUMNS)
    } else {
        format!("SELECT {} FROM users ORDER BY created_at, rowid", USER_COLUMNS)
    };

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
