//! `webprof.toml` config loading.

use crate::templates::PanelConfig;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "webprof.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ProfilerConfig {
    /// Where the toolbar docks when the request doesn't say
    pub toolbar_position: String,

    /// Path prefix of the profiler routes.
    pub route_prefix: String,

    /// Whether the full profiler view is routed; the toolbar still works without it.
    pub profiler_route: bool,

    /// Result count used when a search gives no usable limit.
    pub search_limit: usize,

    /// Panels in navigation order.
    pub panels: Vec<PanelConfig>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            toolbar_position: "bottom".to_string(),
            route_prefix: "/_profiler".to_string(),
            profiler_route: true,
            search_limit: 10,
            panels: PanelConfig::defaults(),
        }
    }
}

impl ProfilerConfig {
    /// Load a config file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file, falling back to defaults when it is missing or broken
    #[must_use]
    pub fn load_optional(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(err) => {
                tracing::warn!("{err}; using default config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = ProfilerConfig::load_optional(&dir.path().join(CONFIG_FILE));
        assert_eq!(cfg, ProfilerConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            "toolbar_position = \"top\"\nprofiler_route = false\n\n[[panels]]\ncollector = \"time\"\ntemplate = \"@WebProfiler/Collector/time.html\"\n",
        )
        .unwrap();

        let cfg = ProfilerConfig::load(&path).unwrap();
        assert_eq!(cfg.toolbar_position, "top");
        assert!(!cfg.profiler_route);
        assert_eq!(cfg.route_prefix, "/_profiler");
        assert_eq!(cfg.search_limit, 10);
        assert_eq!(cfg.panels, vec![PanelConfig::builtin("time")]);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "search_limit = \"many\"").unwrap();

        assert!(matches!(
            ProfilerConfig::load(&path),
            Err(ConfigError::Toml { .. })
        ));
        assert_eq!(ProfilerConfig::load_optional(&path), ProfilerConfig::default());
    }
}
