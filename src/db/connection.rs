use rusqlite::Connection;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::errors::StorageError;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");

// Thread-local connection slot, tagged with the path it was opened for.
thread_local! {
    static DB_CONN: RefCell<Option<(PathBuf, Connection)>> = RefCell::new(None);
}

#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Provides a mutable connection to the closure, opening it on first use in this thread.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError>,
    {
        DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let reusable = matches!(slot.as_ref(), Some((path, _)) if *path == self.path);
                if !reusable {
                    let conn = Connection::open(&self.path)
                        .map_err(|e| StorageError::Db(format!("Open DB failed: {e}")))?;
                    *slot = Some((self.path.clone(), conn));
                }
                match slot.as_mut() {
                    Some((_, conn)) => f(conn),
                    None => Err(StorageError::Db("connection slot empty".into())),
                }
            })
            .map_err(|_| StorageError::Db("thread-local connection unavailable".into()))?
    }
}

/// Create the tables if they are missing. Safe to run on every start.
pub fn init_db(db: &Database) -> Result<(), StorageError> {
    db.with_conn(|conn| {
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StorageError::Db(format!("Failed to apply schema: {e}")))?;
        Ok(())
    })?;

    info!(path = %db.path().display(), "Database initialized");
    Ok(())
}
