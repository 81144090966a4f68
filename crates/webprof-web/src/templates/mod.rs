//! Template rendering
//!
//! Controllers hand a template name and a JSON context to a
//! [`TemplateRenderer`]; [`TemplateManager`] decides which template renders
//! which panel of a profile.

mod html;
mod manager;

pub use html::{escape, HtmlRenderer};
pub use manager::{PanelConfig, PanelTemplate, PanelTemplates, TemplateManager};

use serde_json::{Map, Value};
use thiserror::Error;

/// Data handed to a template
pub type Context = Map<String, Value>;

/// Informational messages page
pub const INFO_TEMPLATE: &str = "@WebProfiler/Profiler/info.html";
/// Debug toolbar fragment
pub const TOOLBAR_TEMPLATE: &str = "@WebProfiler/Profiler/toolbar.html";
/// Search bar fragment
pub const SEARCH_TEMPLATE: &str = "@WebProfiler/Profiler/search.html";
/// Search results page
pub const RESULTS_TEMPLATE: &str = "@WebProfiler/Profiler/results.html";
/// Prefix shared by collector panel templates
pub const COLLECTOR_TEMPLATE_PREFIX: &str = "@WebProfiler/Collector/";

/// Template errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template \"{0}\" does not exist")]
    NotFound(String),

    #[error("The profiler template \"{template}\" for data collector \"{collector}\" does not exist")]
    MissingPanel { template: String, collector: String },

    #[error("Failed to render \"{template}\": {message}")]
    Render { template: String, message: String },
}

/// Renders named templates
pub trait TemplateRenderer {
    /// Render a template with the given context
    ///
    /// # Errors
    /// Returns an error if the template does not exist or fails to render
    fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError>;

    /// Whether the renderer knows the template
    fn exists(&self, template: &str) -> bool;
}

/// Turn a `json!({...})` object into a template context
#[must_use]
pub fn context(value: Value) -> Context {
    match value {
        Value::Object(map) => map,
        _ => Context::new(),
    }
}
