use rusqlite::{params, Row};

use crate::db::models::MonumentVisit;
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_visit(row: &Row) -> rusqlite::Result<MonumentVisit> {
    Ok(MonumentVisit {
        id: row.get("id")?,
        monument_id: row.get("monument_id")?,
        visit_date: row.get("visit_date")?,
        last_action: row.get("last_action")?,
    })
}

/// Append a visit. Ids come from AUTOINCREMENT, so they never repeat or go backwards.
pub fn record(pool: &DbPool, monument_id: &str) -> Result<MonumentVisit, AppError> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO monument_visits (monument_id, visit_date, last_action)
         VALUES (?1, ?2, ?2)",
        params![monument_id, now],
    )?;
    let id = conn.last_insert_rowid();

    tracing::debug!(monument_id = %monument_id, visit_id = id, "Monument visit recorded");

    Ok(MonumentVisit {
        id,
        monument_id: monument_id.to_string(),
        visit_date: now.clone(),
        last_action: now,
    })
}

pub fn get_by_id(pool: &DbPool, id: i64) -> Result<MonumentVisit, AppError> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT * FROM monument_visits WHERE id = ?1",
        params![id],
        row_to_visit,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("MonumentVisit {id}")),
        other => AppError::Database(other),
    })
}

pub fn count_for_monument(pool: &DbPool, monument_id: &str) -> Result<i64, AppError> {
    let conn = pool.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM monument_visits WHERE monument_id = ?1",
        params![monument_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_recent(
    pool: &DbPool,
    monument_id: &str,
    limit: Option<i64>,
) -> Result<Vec<MonumentVisit>, AppError> {
    let limit = limit.unwrap_or(50);
    let conn = pool.get()?;

    let mut stmt = conn.prepare(
        "SELECT * FROM monument_visits
         WHERE monument_id = ?1
         ORDER BY id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![monument_id, limit], row_to_visit)?;
    let visits = rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)?;
    Ok(visits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;

    #[test]
    fn test_ids_increase() {
        let pool = init_test_db().unwrap();
        let a = record(&pool, "taj-mahal").unwrap();
        let b = record(&pool, "taj-mahal").unwrap();
        let c = record(&pool, "red-fort").unwrap();
        assert!(a.id < b.id && b.id < c.id);
        assert_eq!(a.visit_date, a.last_action);
        assert_eq!(count_for_monument(&pool, "taj-mahal").unwrap(), 2);
        assert_eq!(count_for_monument(&pool, "hampi").unwrap(), 0);
    }

    #[test]
    fn test_get_by_id_and_recent() {
        let pool = init_test_db().unwrap();
        let first = record(&pool, "hampi").unwrap();
        let second = record(&pool, "hampi").unwrap();

        let fetched = get_by_id(&pool, first.id).unwrap();
        assert_eq!(fetched.monument_id, "hampi");

        let recent = get_recent(&pool, "hampi", Some(1)).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, second.id);

        assert!(matches!(get_by_id(&pool, 9999), Err(AppError::NotFound(_))));
    }
}
