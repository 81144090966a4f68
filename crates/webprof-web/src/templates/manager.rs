//! Panel template resolution

use super::{TemplateError, TemplateRenderer, COLLECTOR_TEMPLATE_PREFIX};
use crate::error::ControllerError;
use serde::{Deserialize, Serialize};
use webprof_core::{Profile, Profiler};

const TEMPLATE_SUFFIX: &str = ".html";

/// Collectors shown by default, in navigation order
const DEFAULT_PANELS: [&str; 7] = [
    "request",
    "time",
    "memory",
    "events",
    "logger",
    "exception",
    "config",
];

/// Which template renders a collector's panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Collector name
    pub collector: String,
    /// Template name; a missing `.html` suffix is added
    pub template: String,
}

impl PanelConfig {
    /// Panel using the built-in collector template
    #[must_use]
    pub fn builtin(collector: &str) -> Self {
        Self {
            collector: collector.to_string(),
            template: format!("{COLLECTOR_TEMPLATE_PREFIX}{collector}{TEMPLATE_SUFFIX}"),
        }
    }

    /// The default panel list
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        DEFAULT_PANELS.iter().map(|name| Self::builtin(name)).collect()
    }
}

/// One resolved panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelTemplate {
    /// Panel (collector) name
    pub name: String,
    /// Template rendering it
    pub template: String,
}

/// Panels available for one profile, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PanelTemplates(Vec<PanelTemplate>);

impl PanelTemplates {
    /// Template for a panel
    #[must_use]
    pub fn get(&self, panel: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|p| p.name == panel)
            .map(|p| p.template.as_str())
    }

    /// Template for a panel, or a not-found error
    ///
    /// # Errors
    /// Returns `NotFound` if the panel is not available
    pub fn resolve(&self, panel: &str) -> Result<&str, ControllerError> {
        self.get(panel).ok_or_else(|| {
            ControllerError::NotFound(format!(
                "Panel \"{panel}\" is not registered in profiler or is not present in viewed profile."
            ))
        })
    }

    /// Panel names, in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.name.as_str()).collect()
    }

    /// Number of panels
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no panel is available
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps profile panels to templates
#[derive(Debug, Clone)]
pub struct TemplateManager {
    panels: Vec<PanelConfig>,
}

impl Default for TemplateManager {
    fn default() -> Self {
        Self::new(PanelConfig::defaults())
    }
}

impl TemplateManager {
    /// A manager over the given panel configuration
    #[must_use]
    pub fn new(panels: Vec<PanelConfig>) -> Self {
        Self { panels }
    }

    /// Panels the profile can show
    ///
    /// A panel is listed when its collector is registered with the profiler
    /// and present in the profile.
    ///
    /// # Errors
    /// Returns an error if a listed panel's template does not exist
    pub fn templates(
        &self,
        profiler: &Profiler,
        renderer: &dyn TemplateRenderer,
        profile: &Profile,
    ) -> Result<PanelTemplates, TemplateError> {
        let mut templates = Vec::new();

        for panel in &self.panels {
            if !profiler.has(&panel.collector) || !profile.has_collector(&panel.collector) {
                continue;
            }
            if templates.iter().any(|t: &PanelTemplate| t.name == panel.collector) {
                continue;
            }

            let base = panel
                .template
                .strip_suffix(TEMPLATE_SUFFIX)
                .unwrap_or(&panel.template);
            let template = format!("{base}{TEMPLATE_SUFFIX}");
            if !renderer.exists(&template) {
                return Err(TemplateError::MissingPanel {
                    template,
                    collector: panel.collector.clone(),
                });
            }

            templates.push(PanelTemplate {
                name: panel.collector.clone(),
                template,
            });
        }

        Ok(PanelTemplates(templates))
    }
}
