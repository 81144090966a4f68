//! Profile storage
//!
//! [`ProfilerStorage`] is the seam the profiler talks to; [`SqliteStorage`]
//! keeps profiles in a single `SQLite` table with the searchable fields
//! copied out of the JSON blob.

use crate::profile::{Profile, ProfileSummary};
use crate::storage::db::{Database, DatabaseError};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, OptionalExtension};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to serialize profile: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored row: {0}")]
    InvalidRow(String),
}

/// Filter for [`ProfilerStorage::find`]
///
/// Empty strings are treated the same as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    /// Substring of the client IP
    pub ip: Option<String>,
    /// Substring of the request URL
    pub url: Option<String>,
    /// Substring of the HTTP method
    pub method: Option<String>,
    /// Maximum number of results
    pub limit: usize,
    /// Only profiles captured at or after this time
    pub start: Option<DateTime<Utc>>,
    /// Only profiles captured at or before this time
    pub end: Option<DateTime<Utc>>,
}

impl FindQuery {
    /// Query matching everything, bounded by `limit`
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }
}

/// Persistence contract for profiles
pub trait ProfilerStorage {
    /// Index entries matching the query, most recent first
    ///
    /// # Errors
    /// Returns an error if the storage cannot be queried
    fn find(&self, query: &FindQuery) -> Result<Vec<ProfileSummary>, StorageError>;

    /// The profile with the given token, if stored
    ///
    /// # Errors
    /// Returns an error if the storage cannot be read
    fn read(&self, token: &str) -> Result<Option<Profile>, StorageError>;

    /// Store a profile; returns `false` if the token is already taken
    ///
    /// # Errors
    /// Returns an error if the profile cannot be written
    fn write(&self, profile: &Profile) -> Result<bool, StorageError>;

    /// Delete every stored profile
    ///
    /// # Errors
    /// Returns an error if the storage cannot be cleared
    fn purge(&self) -> Result<(), StorageError>;
}

/// `SQLite`-backed profile storage
///
/// Results of `find` are ordered by capture time, newest first; profiles
/// captured in the same millisecond come back newest insert first.
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    /// Wrap an open database
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Storage over a fresh in-memory database
    ///
    /// # Errors
    /// Returns an error if the database cannot be created
    pub fn in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(Database::in_memory()?))
    }

    fn child_tokens(&self, token: &str) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.db.connection().prepare(
            r"
            SELECT token FROM profiles WHERE parent = ?1 ORDER BY time, rowid
            ",
        )?;
        let rows = stmt.query_map(params![token], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

impl ProfilerStorage for SqliteStorage {
    fn find(&self, query: &FindQuery) -> Result<Vec<ProfileSummary>, StorageError> {
        let mut sql = String::from(
            "SELECT token, ip, method, url, status_code, time, parent FROM profiles WHERE 1 = 1",
        );
        let mut args: Vec<SqlValue> = Vec::new();

        for (column, value) in [
            ("ip", &query.ip),
            ("url", &query.url),
            ("method", &query.method),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                sql.push_str(&format!(" AND instr({column}, ?) > 0"));
                args.push(SqlValue::Text(value.to_string()));
            }
        }
        if let Some(start) = query.start {
            sql.push_str(" AND time >= ?");
            args.push(SqlValue::Integer(start.timestamp_millis()));
        }
        if let Some(end) = query.end {
            sql.push_str(" AND time <= ?");
            args.push(SqlValue::Integer(end.timestamp_millis()));
        }
        sql.push_str(" ORDER BY time DESC, rowid DESC LIMIT ?");
        args.push(SqlValue::Integer(
            i64::try_from(query.limit).unwrap_or(i64::MAX),
        ));

        let mut stmt = self.db.connection().prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (token, ip, method, url, status_code, millis, parent) = row?;
            let time = Utc.timestamp_millis_opt(millis).single().ok_or_else(|| {
                StorageError::InvalidRow(format!("Invalid time {millis} for token {token}"))
            })?;

            summaries.push(ProfileSummary {
                token,
                ip,
                method,
                url,
                status_code: status_code.and_then(|c| u16::try_from(c).ok()),
                time,
                parent,
            });
        }

        Ok(summaries)
    }

    fn read(&self, token: &str) -> Result<Option<Profile>, StorageError> {
        let json: Option<String> = self
            .db
            .connection()
            .query_row(
                "SELECT data FROM profiles WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = json else {
            return Ok(None);
        };

        let mut profile: Profile = serde_json::from_str(&json)?;
        for child in self.child_tokens(token)? {
            if !profile.children.contains(&child) {
                profile.children.push(child);
            }
        }

        Ok(Some(profile))
    }

    fn write(&self, profile: &Profile) -> Result<bool, StorageError> {
        let json = serde_json::to_string(profile)?;

        let inserted = self.db.connection().execute(
            r"
            INSERT OR IGNORE INTO profiles (token, parent, ip, method, url, status_code, time, data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                profile.token,
                profile.parent,
                profile.ip,
                profile.method,
                profile.url,
                profile.status_code,
                profile.time.timestamp_millis(),
                json,
            ],
        )?;

        Ok(inserted > 0)
    }

    fn purge(&self) -> Result<(), StorageError> {
        let deleted = self.db.connection().execute("DELETE FROM profiles", [])?;
        tracing::debug!(deleted, "purged profile storage");
        Ok(())
    }
}
