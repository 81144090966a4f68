//! Profile types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Number of hex characters in a generated token
const TOKEN_LENGTH: usize = 6;

/// A captured snapshot of one request's diagnostic data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Opaque unique identifier
    pub token: String,
    /// Token of the profile this one was captured under (sub-requests)
    #[serde(default)]
    pub parent: Option<String>,
    /// Tokens of sub-request profiles
    #[serde(default)]
    pub children: Vec<String>,
    /// Client IP address
    #[serde(default)]
    pub ip: String,
    /// HTTP method
    #[serde(default)]
    pub method: String,
    /// Request URL
    #[serde(default)]
    pub url: String,
    /// Response status code, if the request completed
    #[serde(default)]
    pub status_code: Option<u16>,
    /// When the request was captured
    pub time: DateTime<Utc>,
    /// Collected data keyed by collector name
    #[serde(default)]
    pub collectors: BTreeMap<String, Value>,
}

impl Profile {
    /// Create an empty profile with the given token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            parent: None,
            children: Vec::new(),
            ip: String::new(),
            method: String::new(),
            url: String::new(),
            status_code: None,
            time: Utc::now(),
            collectors: BTreeMap::new(),
        }
    }

    /// Generate a fresh short token
    #[must_use]
    pub fn generate_token() -> String {
        let mut token = Uuid::new_v4().simple().to_string();
        token.truncate(TOKEN_LENGTH);
        token
    }

    /// Whether data for the named collector was captured
    #[must_use]
    pub fn has_collector(&self, name: &str) -> bool {
        self.collectors.contains_key(name)
    }

    /// Data captured by the named collector
    #[must_use]
    pub fn collector(&self, name: &str) -> Option<&Value> {
        self.collectors.get(name)
    }

    /// Attach collector data, replacing any previous data under that name
    pub fn add_collector(&mut self, name: impl Into<String>, data: Value) {
        self.collectors.insert(name.into(), data);
    }

    /// Names of every collector present in this profile
    pub fn collector_names(&self) -> impl Iterator<Item = &str> {
        self.collectors.keys().map(String::as_str)
    }
}

/// Profile index entry (without collector data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Profile token
    pub token: String,
    /// Client IP address
    pub ip: String,
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Response status code
    pub status_code: Option<u16>,
    /// When captured
    pub time: DateTime<Utc>,
    /// Parent token
    pub parent: Option<String>,
}
