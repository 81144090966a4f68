//! Profile database handle

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::migrations;

/// How long a writer waits on a locked profile database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// An open, migrated profile database
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the profile database at `path`, creating it if needed
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or migrated
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self::migrated(conn)?;
        tracing::debug!(path = %path.display(), "opened profile database");
        Ok(db)
    }

    /// A throwaway database that lives as long as the handle
    ///
    /// # Errors
    /// Returns an error if the database cannot be created
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(conn: Connection) -> Result<Self, DatabaseError> {
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// The underlying connection
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
