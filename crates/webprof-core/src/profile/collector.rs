//! Data collectors
//!
//! A collector turns a finished request into one named block of diagnostic
//! data. The profiler runs every registered collector when it builds a profile.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// What the host application reports about a completed request
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Client IP address
    pub ip: String,
    /// Response status code
    pub status_code: Option<u16>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Query string parameters
    pub query: BTreeMap<String, String>,
    /// When handling started
    pub started_at: DateTime<Utc>,
    /// Wall-clock time spent handling the request
    pub duration: Duration,
    /// Peak memory in bytes, when the host can measure it
    pub peak_memory: Option<u64>,
    /// Token of the enclosing request's profile
    pub parent: Option<String>,
}

impl RequestSnapshot {
    /// Snapshot of a request that started now
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ip: ip.into(),
            status_code: None,
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
            peak_memory: None,
            parent: None,
        }
    }
}

/// Gathers one category of diagnostic data
pub trait DataCollector {
    /// Panel/collector name, unique within a profiler
    fn name(&self) -> &str;

    /// Collect data for the given request
    fn collect(&self, request: &RequestSnapshot) -> Value;
}

/// Request line, headers and query parameters
#[derive(Debug, Default)]
pub struct RequestCollector;

impl DataCollector for RequestCollector {
    fn name(&self) -> &str {
        "request"
    }

    fn collect(&self, request: &RequestSnapshot) -> Value {
        json!({
            "method": request.method,
            "url": request.url,
            "ip": request.ip,
            "status_code": request.status_code,
            "headers": request.headers,
            "query": request.query,
        })
    }
}

/// Start time and duration
#[derive(Debug, Default)]
pub struct TimeCollector;

impl DataCollector for TimeCollector {
    fn name(&self) -> &str {
        "time"
    }

    fn collect(&self, request: &RequestSnapshot) -> Value {
        let duration_ms = request.duration.as_secs_f64() * 1000.0;
        json!({
            "start_time": request.started_at.to_rfc3339(),
            "duration_ms": duration_ms,
        })
    }
}

/// Peak memory usage
#[derive(Debug, Default)]
pub struct MemoryCollector;

impl DataCollector for MemoryCollector {
    fn name(&self) -> &str {
        "memory"
    }

    fn collect(&self, request: &RequestSnapshot) -> Value {
        json!({ "peak_memory": request.peak_memory })
    }
}

/// The collectors a profiler registers out of the box
#[must_use]
pub fn default_collectors() -> Vec<Box<dyn DataCollector>> {
    vec![
        Box::new(RequestCollector),
        Box::new(TimeCollector),
        Box::new(MemoryCollector),
    ]
}
