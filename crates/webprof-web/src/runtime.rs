//! Runtime diagnostics dump

use crate::templates::escape;
use chrono::Utc;
use std::fmt::Write;

/// Snapshot of the hosting process and runtime
#[derive(Debug, Clone)]
pub struct RuntimeInfo {
    entries: Vec<(&'static str, String)>,
    env_names: Vec<String>,
}

impl RuntimeInfo {
    /// Inspect the current process
    #[must_use]
    pub fn collect() -> Self {
        let display = |result: Result<std::path::PathBuf, std::io::Error>| {
            result.map_or_else(|e| format!("unavailable ({e})"), |p| p.display().to_string())
        };

        let entries = vec![
            ("Version", env!("CARGO_PKG_VERSION").to_string()),
            ("Operating system", std::env::consts::OS.to_string()),
            ("OS family", std::env::consts::FAMILY.to_string()),
            ("Architecture", std::env::consts::ARCH.to_string()),
            (
                "Build profile",
                if cfg!(debug_assertions) { "debug" } else { "release" }.to_string(),
            ),
            ("Process ID", std::process::id().to_string()),
            ("Executable", display(std::env::current_exe())),
            ("Working directory", display(std::env::current_dir())),
            (
                "Available parallelism",
                std::thread::available_parallelism()
                    .map_or_else(|_| "unknown".to_string(), |n| n.to_string()),
            ),
            ("Current time", Utc::now().to_rfc3339()),
        ];

        // Names only, never values
        let mut env_names: Vec<String> = std::env::vars_os()
            .map(|(key, _)| key.to_string_lossy().into_owned())
            .collect();
        env_names.sort();

        Self { entries, env_names }
    }

    /// Value of one entry
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == label)
            .map(|(_, value)| value.as_str())
    }

    /// Sorted environment variable names
    #[must_use]
    pub fn env_names(&self) -> &[String] {
        &self.env_names
    }

    /// Render as a standalone HTML page
    ///
    /// # Errors
    /// Returns an error if formatting fails
    pub fn to_html(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "<!DOCTYPE html>")?;
        writeln!(out, "<html><head><meta charset=\"UTF-8\"><title>Runtime information</title></head><body>")?;
        writeln!(out, "<h1>webprof runtime</h1>")?;
        writeln!(out, "<table>")?;
        for (key, value) in &self.entries {
            writeln!(
                out,
                "<tr><th>{}</th><td>{}</td></tr>",
                escape(key),
                escape(value)
            )?;
        }
        writeln!(out, "</table>")?;
        writeln!(out, "<h2>Environment</h2>")?;
        writeln!(out, "<ul>")?;
        for name in &self.env_names {
            writeln!(out, "<li>{}</li>", escape(name))?;
        }
        writeln!(out, "</ul>")?;
        writeln!(out, "</body></html>")?;
        Ok(out)
    }
}
