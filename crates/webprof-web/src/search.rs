//! Profile search filters

use crate::http::Request;
use crate::session::Session;
use webprof_core::FindQuery;

/// Session key for the remembered IP filter
pub const SESSION_IP: &str = "_profiler_search_ip";
/// Session key for the remembered method filter
pub const SESSION_METHOD: &str = "_profiler_search_method";
/// Session key for the remembered URL filter
pub const SESSION_URL: &str = "_profiler_search_url";
/// Session key for the remembered limit
pub const SESSION_LIMIT: &str = "_profiler_search_limit";
/// Session key for the remembered token
pub const SESSION_TOKEN: &str = "_profiler_search_token";

/// The five search fields, as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub ip: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub limit: Option<String>,
    pub token: Option<String>,
}

impl SearchFilter {
    /// Read the filter from query parameters
    #[must_use]
    pub fn from_query(request: &Request<'_>) -> Self {
        let get = |key: &str| request.query(key).map(str::to_string);
        Self {
            ip: get("ip"),
            method: get("method"),
            url: get("url"),
            limit: get("limit"),
            token: get("token"),
        }
    }

    /// Read the filter remembered in a session
    #[must_use]
    pub fn from_session<S: Session + ?Sized>(session: &S) -> Self {
        let get = |key: &str| session.get(key).map(str::to_string);
        Self {
            ip: get(SESSION_IP),
            method: get(SESSION_METHOD),
            url: get(SESSION_URL),
            limit: get(SESSION_LIMIT),
            token: get(SESSION_TOKEN),
        }
    }

    /// Remember the filter in a session
    pub fn store<S: Session + ?Sized>(&self, session: &mut S) {
        session.set(SESSION_IP, self.ip.clone());
        session.set(SESSION_METHOD, self.method.clone());
        session.set(SESSION_URL, self.url.clone());
        session.set(SESSION_LIMIT, self.limit.clone());
        session.set(SESSION_TOKEN, self.token.clone());
    }

    /// Storage query for this filter
    ///
    /// A missing or non-numeric limit falls back to `default_limit`.
    #[must_use]
    pub fn to_find_query(&self, default_limit: usize) -> FindQuery {
        let limit = self
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse().ok())
            .unwrap_or(default_limit);
        FindQuery {
            ip: self.ip.clone(),
            url: self.url.clone(),
            method: self.method.clone(),
            ..FindQuery::new(limit)
        }
    }

    /// Filter values carried on a results redirect, skipping unset ones
    #[must_use]
    pub fn redirect_params(&self) -> Vec<(&'static str, &str)> {
        [
            ("ip", &self.ip),
            ("method", &self.method),
            ("url", &self.url),
            ("limit", &self.limit),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

/// Keep only the characters that can appear in an IPv4/IPv6 address
#[must_use]
pub fn sanitize_ip(ip: &str) -> String {
    ip.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ':')
        .collect()
}
