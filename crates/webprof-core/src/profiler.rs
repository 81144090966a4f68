//! The profiler facade
//!
//! Ties storage, the export codec and the registered collectors together.
//! Controllers only ever talk to a [`Profiler`].

use crate::profile::collector::default_collectors;
use crate::profile::export::{decode_profile, encode_profile, ExportError};
use crate::profile::{DataCollector, Profile, ProfileSummary, RequestSnapshot};
use crate::storage::{FindQuery, ProfilerStorage, StorageError};
use std::cell::Cell;
use thiserror::Error;

/// Profiler errors
#[derive(Error, Debug)]
pub enum ProfilerError {
    #[error("Profile storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Profile export error: {0}")]
    Export(#[from] ExportError),
}

/// Profiler facade over a storage backend and a set of collectors
pub struct Profiler {
    storage: Box<dyn ProfilerStorage>,
    collectors: Vec<Box<dyn DataCollector>>,
    enabled: Cell<bool>,
}

impl Profiler {
    /// Create a profiler with no collectors registered
    #[must_use]
    pub fn new(storage: Box<dyn ProfilerStorage>) -> Self {
        Self {
            storage,
            collectors: Vec::new(),
            enabled: Cell::new(true),
        }
    }

    /// Create a profiler with the built-in collectors registered
    #[must_use]
    pub fn with_default_collectors(storage: Box<dyn ProfilerStorage>) -> Self {
        let mut profiler = Self::new(storage);
        for collector in default_collectors() {
            profiler.add(collector);
        }
        profiler
    }

    /// Register a collector, replacing any collector with the same name
    pub fn add(&mut self, collector: Box<dyn DataCollector>) {
        self.collectors.retain(|c| c.name() != collector.name());
        self.collectors.push(collector);
    }

    /// Whether a collector with this name is registered
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.collectors.iter().any(|c| c.name() == name)
    }

    /// Names of the registered collectors, in registration order
    #[must_use]
    pub fn collector_names(&self) -> Vec<&str> {
        self.collectors.iter().map(|c| c.name()).collect()
    }

    /// Stop capturing for the current request
    pub fn disable(&self) {
        self.enabled.set(false);
    }

    /// Resume capturing
    pub fn enable(&self) {
        self.enabled.set(true);
    }

    /// Whether the current request will be captured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Load a profile by token
    ///
    /// # Errors
    /// Returns an error if the storage cannot be read
    pub fn load_profile(&self, token: &str) -> Result<Option<Profile>, ProfilerError> {
        Ok(self.storage.read(token)?)
    }

    /// Persist a profile; `false` if its token is already stored
    ///
    /// # Errors
    /// Returns an error if the storage cannot be written
    pub fn save_profile(&self, profile: &Profile) -> Result<bool, ProfilerError> {
        Ok(self.storage.write(profile)?)
    }

    /// Search stored profiles, most recent first
    ///
    /// # Errors
    /// Returns an error if the storage cannot be queried
    pub fn find(&self, query: &FindQuery) -> Result<Vec<ProfileSummary>, ProfilerError> {
        Ok(self.storage.find(query)?)
    }

    /// Delete every stored profile
    ///
    /// # Errors
    /// Returns an error if the storage cannot be cleared
    pub fn purge(&self) -> Result<(), ProfilerError> {
        self.storage.purge()?;
        tracing::info!("purged all stored profiles");
        Ok(())
    }

    /// Serialize a profile for download
    ///
    /// # Errors
    /// Returns an error if the profile cannot be encoded
    pub fn export(&self, profile: &Profile) -> Result<String, ProfilerError> {
        Ok(encode_profile(profile)?)
    }

    /// Import an exported profile
    ///
    /// Returns `None` when a profile with the same token is already stored.
    ///
    /// # Errors
    /// Returns an error if the data is not a valid export or cannot be stored
    pub fn import(&self, data: &str) -> Result<Option<Profile>, ProfilerError> {
        let profile = decode_profile(data)?;

        if self.storage.read(&profile.token)?.is_some() || !self.storage.write(&profile)? {
            tracing::debug!(token = %profile.token, "imported profile already exists");
            return Ok(None);
        }

        tracing::info!(token = %profile.token, "imported profile");
        Ok(Some(profile))
    }

    /// Build a profile for a finished request
    ///
    /// Returns `None` while the profiler is disabled. The profile is not saved.
    #[must_use]
    pub fn collect(&self, request: &RequestSnapshot) -> Option<Profile> {
        if !self.is_enabled() {
            return None;
        }

        let mut profile = Profile::new(Profile::generate_token());
        profile.parent = request.parent.clone();
        profile.ip = request.ip.clone();
        profile.method = request.method.clone();
        profile.url = request.url.clone();
        profile.status_code = request.status_code;
        profile.time = request.started_at;

        for collector in &self.collectors {
            profile.add_collector(collector.name(), collector.collect(request));
        }

        Some(profile)
    }
}
