pub mod catalog;
pub mod migrations;
pub mod models;
pub mod repos;
pub mod state_keys;

use r2d2::{CustomizeConnection, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

use crate::error::AppError;

pub type DbPool = Pool<SqliteConnectionManager>;

const DB_FILE: &str = "historica.db";

/// Per-connection pragmas, applied whenever r2d2 hands out a connection.
#[derive(Debug)]
struct HistoricaPragmas;

impl CustomizeConnection<rusqlite::Connection, rusqlite::Error> for HistoricaPragmas {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )
    }
}

/// Pragmas for a throwaway database; owns the directory holding it, so the
/// database and its WAL files go away with the pool.
#[derive(Debug)]
struct ScratchPragmas {
    _dir: tempfile::TempDir,
}

impl CustomizeConnection<rusqlite::Connection, rusqlite::Error> for ScratchPragmas {
    fn on_acquire(&self, conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
        HistoricaPragmas.on_acquire(conn)
    }
}

/// Open (creating if needed) `<data_dir>/historica.db` and migrate it.
pub fn init_db(data_dir: &Path) -> Result<DbPool, AppError> {
    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join(DB_FILE);
    tracing::info!(path = %path.display(), "Opening database");

    let pool = open_pool(&path, 8, Duration::from_secs(30), Box::new(HistoricaPragmas))?;
    tracing::info!("Database ready");
    Ok(pool)
}

/// Migrated pool over a throwaway temp file.
///
/// In-memory databases aren't shared across r2d2 connections, so each call
/// gets its own temp directory instead. The directory is removed once the
/// last clone of the pool is dropped.
pub fn init_test_db() -> Result<DbPool, AppError> {
    let dir = tempfile::Builder::new().prefix("historica_test_").tempdir()?;
    let path = dir.path().join(DB_FILE);
    open_pool(&path, 2, Duration::from_secs(5), Box::new(ScratchPragmas { _dir: dir }))
}

type Customizer = Box<dyn CustomizeConnection<rusqlite::Connection, rusqlite::Error>>;

fn open_pool(
    path: &Path,
    max_size: u32,
    timeout: Duration,
    customizer: Customizer,
) -> Result<DbPool, AppError> {
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_timeout(timeout)
        .connection_customizer(customizer)
        .build(SqliteConnectionManager::file(path))?;

    let conn = pool.get()?;
    // Journal mode is database-wide; setting it once is enough.
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    migrations::run(&conn)?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_path(pool: &DbPool) -> std::path::PathBuf {
        let conn = pool.get().unwrap();
        let file: String = conn
            .query_row("SELECT file FROM pragma_database_list WHERE name = 'main'", [], |row| {
                row.get(0)
            })
            .unwrap();
        std::path::PathBuf::from(file)
    }

    #[test]
    fn test_scratch_db_removed_on_drop() {
        let pool = init_test_db().unwrap();
        let path = db_path(&pool);
        let dir = path.parent().unwrap().to_path_buf();
        assert!(path.exists());
        assert!(dir
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("historica_test_"));

        let clone = pool.clone();
        drop(pool);
        assert!(dir.exists());

        drop(clone);
        // r2d2's worker threads may briefly hold the last reference.
        for _ in 0..100 {
            if !dir.exists() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(!dir.exists());
    }

    #[test]
    fn test_scratch_dbs_are_isolated() {
        let a = init_test_db().unwrap();
        let b = init_test_db().unwrap();
        assert_ne!(db_path(&a), db_path(&b));
    }
}
