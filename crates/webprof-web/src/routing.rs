//! URL generation for the profiler's named routes

use std::collections::BTreeMap;
use thiserror::Error;
use url::{Position, Url};

/// Full profiler view of one profile
pub const PROFILER_ROUTE: &str = "_profiler";
/// Profiler landing page
pub const HOME_ROUTE: &str = "_profiler_home";
/// Search form target
pub const SEARCH_ROUTE: &str = "_profiler_search";
/// Search bar fragment
pub const SEARCH_BAR_ROUTE: &str = "_profiler_search_bar";
/// Search results for a token
pub const SEARCH_RESULTS_ROUTE: &str = "_profiler_search_results";
/// Purge all profiles
pub const PURGE_ROUTE: &str = "_profiler_purge";
/// Informational messages
pub const INFO_ROUTE: &str = "_profiler_info";
/// Profile upload
pub const IMPORT_ROUTE: &str = "_profiler_import";
/// Profile download
pub const EXPORT_ROUTE: &str = "_profiler_export";
/// Runtime diagnostics
pub const RUNTIME_INFO_ROUTE: &str = "_profiler_runtime_info";
/// Web debug toolbar fragment
pub const TOOLBAR_ROUTE: &str = "_wdt";

/// Routes are resolved against this base and returned without the origin
const BASE_URL: &str = "http://localhost/";

/// Routing errors
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Route \"{0}\" does not exist")]
    NotFound(String),

    #[error("Missing parameter \"{parameter}\" to generate a URL for route \"{route}\"")]
    MissingParameter { route: String, parameter: String },

    #[error("Invalid base URL: {0}")]
    InvalidBase(#[from] url::ParseError),
}

/// Builds URLs from route names
pub trait UrlGenerator {
    /// URL path (and query) for a named route
    ///
    /// Parameters that fill a `{placeholder}` go into the path; the rest
    /// become query parameters in the order given.
    ///
    /// # Errors
    /// Returns an error if the route is unknown or a placeholder is unfilled
    fn generate(&self, route: &str, params: &[(&str, &str)]) -> Result<String, RouteError>;
}

/// Route name to path pattern table
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: BTreeMap<String, String>,
}

impl RouteTable {
    /// An empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The profiler's routes under `prefix` (e.g. `/_profiler`)
    #[must_use]
    pub fn profiler(prefix: &str) -> Self {
        let prefix = prefix.trim_end_matches('/');
        let mut table = Self::new();
        for (name, path) in [
            (HOME_ROUTE, "/"),
            (SEARCH_ROUTE, "/search"),
            (SEARCH_BAR_ROUTE, "/search_bar"),
            (PURGE_ROUTE, "/purge"),
            (INFO_ROUTE, "/info/{about}"),
            (IMPORT_ROUTE, "/import"),
            (EXPORT_ROUTE, "/export/{token}.txt"),
            (RUNTIME_INFO_ROUTE, "/runtime_info"),
            (SEARCH_RESULTS_ROUTE, "/{token}/search/results"),
            (PROFILER_ROUTE, "/{token}"),
        ] {
            table = table.add(name, format!("{prefix}{path}"));
        }
        table.add(TOOLBAR_ROUTE, "/_wdt/{token}")
    }

    /// Register a route
    #[must_use]
    pub fn add(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.routes.insert(name.into(), pattern.into());
        self
    }

    /// Drop a route
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.routes.remove(name);
        self
    }
}

impl UrlGenerator for RouteTable {
    fn generate(&self, route: &str, params: &[(&str, &str)]) -> Result<String, RouteError> {
        let pattern = self
            .routes
            .get(route)
            .ok_or_else(|| RouteError::NotFound(route.to_string()))?;

        let mut used = Vec::new();
        let mut segments = Vec::new();
        for segment in pattern.trim_start_matches('/').split('/') {
            segments.push(fill_placeholders(route, segment, params, &mut used)?);
        }

        let mut url = Url::parse(BASE_URL)?;
        if let Ok(mut path) = url.path_segments_mut() {
            path.clear().extend(segments.iter().map(String::as_str));
        }

        let extra: Vec<_> = params
            .iter()
            .filter(|(key, _)| !used.contains(key))
            .collect();
        if !extra.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }

        Ok(url[Position::BeforePath..].to_string())
    }
}

/// Substitute every `{name}` in one path segment
fn fill_placeholders<'p>(
    route: &str,
    segment: &str,
    params: &[(&'p str, &str)],
    used: &mut Vec<&'p str>,
) -> Result<String, RouteError> {
    let mut out = String::new();
    let mut rest = segment;

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        let name = &rest[open + 1..close];
        let (key, value) = params
            .iter()
            .find(|(key, value)| *key == name && !value.is_empty())
            .ok_or_else(|| RouteError::MissingParameter {
                route: route.to_string(),
                parameter: name.to_string(),
            })?;

        out.push_str(&rest[..open]);
        out.push_str(value);
        used.push(*key);
        rest = &rest[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
