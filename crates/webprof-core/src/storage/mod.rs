//! Storage layer (`SQLite`)

pub mod db;
pub mod migrations;
pub mod profiles;

pub use db::{Database, DatabaseError};
pub use profiles::{FindQuery, ProfilerStorage, SqliteStorage, StorageError};
