//! Durable client-side key/value entries (`client_state` table).

use rusqlite::{params, OptionalExtension};

use crate::db::DbPool;
use crate::error::AppError;

pub fn get(pool: &DbPool, key: &str) -> Result<Option<String>, AppError> {
    let conn = pool.get()?;
    let value = conn
        .query_row(
            "SELECT value FROM client_state WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

/// Insert or replace `key`. The write is committed before returning.
pub fn put(pool: &DbPool, key: &str, value: &str) -> Result<(), AppError> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO client_state (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, chrono::Utc::now().to_rfc3339()],
    )?;
    tracing::trace!(key, bytes = value.len(), "Client state written");
    Ok(())
}

/// Returns whether an entry existed.
pub fn remove(pool: &DbPool, key: &str) -> Result<bool, AppError> {
    let conn = pool.get()?;
    let removed = conn.execute("DELETE FROM client_state WHERE key = ?1", params![key])?;
    Ok(removed > 0)
}
