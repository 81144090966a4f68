//! webprof core - profiles, collectors and storage
//!
//! This crate provides the profile model, the data collectors that fill it,
//! the export codec and `SQLite` profile storage, all behind the
//! [`Profiler`] facade.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod profile;
pub mod profiler;
pub mod storage;

pub use profile::{Profile, ProfileSummary, RequestSnapshot};
pub use profiler::{Profiler, ProfilerError};
pub use storage::{FindQuery, ProfilerStorage, SqliteStorage};
