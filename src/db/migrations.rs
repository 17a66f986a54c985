use rusqlite::Connection;

use crate::error::AppError;

/// Run the schema migration. Idempotent.
pub fn run(conn: &Connection) -> Result<(), AppError> {
    tracing::debug!("Running database migrations");

    conn.execute_batch(SCHEMA)?;

    tracing::info!("Database migrations complete");
    Ok(())
}

const SCHEMA: &str = r#"

-- ============================================================================
-- Client state (visit counter table, welcome flag)
-- ============================================================================

CREATE TABLE IF NOT EXISTS client_state (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

-- ============================================================================
-- Monument visit log
-- ============================================================================

CREATE TABLE IF NOT EXISTS monument_visits (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    monument_id  TEXT NOT NULL,
    visit_date   TEXT NOT NULL,
    last_action  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_monument_visits_monument ON monument_visits(monument_id);

"#;
