//! Profiler web controller
//!
//! One method per profiler page. Every entry point switches off capture for
//! the current request first, so browsing the profiler never profiles itself.

use crate::config::ProfilerConfig;
use crate::error::{ControllerError, ControllerResult};
use crate::http::{Request, Response};
use crate::routing::{
    RouteTable, UrlGenerator, INFO_ROUTE, PROFILER_ROUTE, SEARCH_RESULTS_ROUTE,
};
use crate::runtime::RuntimeInfo;
use crate::search::{sanitize_ip, SearchFilter};
use crate::session::FlashMode;
use crate::templates::{
    context, HtmlRenderer, TemplateError, TemplateManager, TemplateRenderer, INFO_TEMPLATE,
    RESULTS_TEMPLATE, SEARCH_TEMPLATE, TOOLBAR_TEMPLATE,
};
use serde_json::json;
use tracing::{debug, warn};
use webprof_core::{Profiler, ProfilerError};

/// Token used on the results redirect when a search matched nothing
pub const EMPTY_RESULTS_TOKEN: &str = "empty";

/// Default panel shown for a profile
const DEFAULT_PANEL: &str = "request";

/// Default page within a panel
const DEFAULT_PAGE: &str = "home";

/// Form field carrying an imported profile
const IMPORT_FIELD: &str = "file";

/// Handles the profiler's pages
pub struct ProfilerController {
    profiler: Profiler,
    renderer: Box<dyn TemplateRenderer>,
    generator: Box<dyn UrlGenerator>,
    templates: TemplateManager,
    toolbar_position: String,
    search_limit: usize,
}

impl ProfilerController {
    /// Assemble a controller from its collaborators
    #[must_use]
    pub fn new(
        profiler: Profiler,
        renderer: Box<dyn TemplateRenderer>,
        generator: Box<dyn UrlGenerator>,
        templates: TemplateManager,
        toolbar_position: impl Into<String>,
    ) -> Self {
        Self {
            profiler,
            renderer,
            generator,
            templates,
            toolbar_position: toolbar_position.into(),
            search_limit: ProfilerConfig::default().search_limit,
        }
    }

    /// Assemble a controller with the built-in renderer and routes
    #[must_use]
    pub fn from_config(profiler: Profiler, config: &ProfilerConfig) -> Self {
        let mut routes = RouteTable::profiler(&config.route_prefix);
        if !config.profiler_route {
            routes = routes.without(PROFILER_ROUTE);
        }

        Self::new(
            profiler,
            Box::new(HtmlRenderer::new()),
            Box::new(routes),
            TemplateManager::new(config.panels.clone()),
            config.toolbar_position.clone(),
        )
        .with_search_limit(config.search_limit)
    }

    /// Result count used when a search gives no usable limit
    #[must_use]
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// The profiler behind this controller
    #[must_use]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    fn render(&self, template: &str, data: serde_json::Value) -> Result<String, TemplateError> {
        self.renderer.render(template, &context(data))
    }

    fn redirect(&self, route: &str, params: &[(&str, &str)]) -> ControllerResult<Response> {
        Ok(Response::redirect(self.generator.generate(route, params)?))
    }

    /// Show one panel of a profile
    ///
    /// Reads the `panel` (default `request`) and `page` (default `home`)
    /// query parameters. An unknown token renders the "no token" info page.
    ///
    /// # Errors
    /// Returns `NotFound` if the profile has no such panel
    pub fn panel(&self, request: &Request<'_>, token: &str) -> ControllerResult<Response> {
        self.profiler.disable();

        let panel = request.query("panel").unwrap_or(DEFAULT_PANEL);
        let page = request.query("page").unwrap_or(DEFAULT_PAGE);
        debug!(token, panel, page, "showing profiler panel");

        let Some(profile) = self.profiler.load_profile(token)? else {
            let body = self.render(INFO_TEMPLATE, json!({ "about": "no_token", "token": token }))?;
            return Ok(Response::html(body));
        };

        let Some(collector) = profile.collector(panel) else {
            return Err(ControllerError::NotFound(format!(
                "Panel \"{panel}\" is not available for token \"{token}\"."
            )));
        };

        let templates = self
            .templates
            .templates(&self.profiler, self.renderer.as_ref(), &profile)?;
        let template = templates.resolve(panel)?;

        let body = self.render(
            template,
            json!({
                "token": token,
                "profile": profile,
                "collector": collector,
                "panel": panel,
                "page": page,
                "templates": templates,
                "is_ajax": request.is_xml_http_request(),
            }),
        )?;
        Ok(Response::html(body))
    }

    /// Download a profile as `<token>.txt`
    ///
    /// # Errors
    /// Returns `NotFound` if the token is unknown
    pub fn export(&self, token: &str) -> ControllerResult<Response> {
        self.profiler.disable();

        let Some(profile) = self.profiler.load_profile(token)? else {
            return Err(ControllerError::NotFound(format!(
                "Token \"{token}\" does not exist."
            )));
        };

        let data = self.profiler.export(&profile)?;
        Ok(Response::attachment(data, &format!("{token}.txt")))
    }

    /// Delete every stored profile
    ///
    /// # Errors
    /// Returns an error if the storage cannot be purged
    pub fn purge(&self) -> ControllerResult<Response> {
        self.profiler.disable();
        self.profiler.purge()?;

        self.redirect(INFO_ROUTE, &[("about", "purge")])
    }

    /// Import an uploaded export file
    ///
    /// # Errors
    /// Returns an error if the storage fails; bad uploads and duplicate
    /// tokens redirect to an info page instead
    pub fn import(&self, request: &Request<'_>) -> ControllerResult<Response> {
        self.profiler.disable();

        let contents = request
            .file(IMPORT_FIELD)
            .filter(|file| file.is_valid())
            .and_then(|file| std::str::from_utf8(&file.contents).ok());
        let Some(contents) = contents else {
            return self.redirect(INFO_ROUTE, &[("about", "upload_error")]);
        };

        match self.profiler.import(contents) {
            Ok(Some(profile)) => self.redirect(PROFILER_ROUTE, &[("token", profile.token.as_str())]),
            Ok(None) => self.redirect(INFO_ROUTE, &[("about", "already_exists")]),
            Err(ProfilerError::Export(err)) => {
                warn!("rejected profile upload: {err}");
                self.redirect(INFO_ROUTE, &[("about", "upload_error")])
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Render an informational message page
    ///
    /// # Errors
    /// Returns an error if the template fails to render
    pub fn info(&self, about: &str) -> ControllerResult<Response> {
        self.profiler.disable();

        let body = self.render(INFO_TEMPLATE, json!({ "about": about }))?;
        Ok(Response::html(body))
    }

    /// Render the debug toolbar for a profile
    ///
    /// Capture is switched off once auto-expiring flashes are re-armed.
    /// Without a token, or with one that resolves to nothing, the toolbar is
    /// an empty page. If the full profiler view is not routed the toolbar
    /// renders without a link to it.
    ///
    /// # Errors
    /// Returns an error if the storage or template rendering fails
    pub fn toolbar(
        &self,
        request: &mut Request<'_>,
        token: Option<&str>,
        position: Option<&str>,
    ) -> ControllerResult<Response> {
        if let Some(session) = request.session_mut() {
            let flashes = session.flash_bag_mut();
            // The toolbar is its own request; keep flashes for the next real page
            if flashes.mode() == FlashMode::AutoExpire {
                let peeked = flashes.peek_all().clone();
                flashes.set_all(peeked);
            }
        }

        self.profiler.disable();

        let Some(token) = token else {
            return Ok(Response::empty());
        };

        let Some(profile) = self.profiler.load_profile(token)? else {
            debug!(token, "no profile for toolbar");
            return Ok(Response::empty());
        };

        let position = position.unwrap_or(self.toolbar_position.as_str());

        let profiler_url = match self.generator.generate(PROFILER_ROUTE, &[("token", token)]) {
            Ok(url) => Some(url),
            Err(err) => {
                warn!("toolbar rendered without profiler link: {err}");
                None
            }
        };

        let templates = self
            .templates
            .templates(&self.profiler, self.renderer.as_ref(), &profile)?;

        let body = self.render(
            TOOLBAR_TEMPLATE,
            json!({
                "position": position,
                "profile": profile,
                "templates": templates,
                "profiler_url": profiler_url,
                "token": token,
            }),
        )?;
        Ok(Response::html(body))
    }

    /// Render the search bar, pre-filled from the last search in the session
    ///
    /// # Errors
    /// Returns an error if the template fails to render
    pub fn search_bar(&self, request: &Request<'_>) -> ControllerResult<Response> {
        self.profiler.disable();

        let filter = request
            .session()
            .map(SearchFilter::from_session)
            .unwrap_or_default();

        let body = self.render(
            SEARCH_TEMPLATE,
            json!({
                "token": filter.token,
                "ip": filter.ip,
                "method": filter.method,
                "url": filter.url,
                "limit": filter.limit,
            }),
        )?;
        Ok(Response::html(body))
    }

    /// Render search results
    ///
    /// The filter comes from the query string; an unknown token renders with
    /// a null profile.
    ///
    /// # Errors
    /// Returns an error if the storage or template rendering fails
    pub fn search_results(&self, request: &Request<'_>, token: &str) -> ControllerResult<Response> {
        self.profiler.disable();

        let profile = self.profiler.load_profile(token)?;
        let filter = SearchFilter::from_query(request);
        let tokens = self
            .profiler
            .find(&filter.to_find_query(self.search_limit))?;

        let body = self.render(
            RESULTS_TEMPLATE,
            json!({
                "token": token,
                "profile": profile,
                "tokens": tokens,
                "ip": filter.ip,
                "method": filter.method,
                "url": filter.url,
                "limit": filter.limit,
                "panel": null,
            }),
        )?;
        Ok(Response::html(body))
    }

    /// Run a search and redirect to its results
    ///
    /// The filter is remembered in the session for the search bar. An
    /// explicit token jumps straight to that profile.
    ///
    /// # Errors
    /// Returns an error if the storage or URL generation fails
    pub fn search(&self, request: &mut Request<'_>) -> ControllerResult<Response> {
        self.profiler.disable();

        let mut filter = SearchFilter::from_query(request);
        filter.ip = filter.ip.as_deref().map(sanitize_ip);

        if let Some(session) = request.session_mut() {
            filter.store(session);
        }

        if let Some(token) = filter.token.as_deref().filter(|t| !t.is_empty()) {
            return self.redirect(PROFILER_ROUTE, &[("token", token)]);
        }

        let tokens = self
            .profiler
            .find(&filter.to_find_query(self.search_limit))?;
        let token = tokens
            .first()
            .map_or(EMPTY_RESULTS_TOKEN, |summary| summary.token.as_str());
        debug!(matches = tokens.len(), token, "profile search");

        let mut params = vec![("token", token)];
        params.extend(filter.redirect_params());
        self.redirect(SEARCH_RESULTS_ROUTE, &params)
    }

    /// Dump information about the hosting runtime
    ///
    /// # Errors
    /// Returns an error if the page fails to render
    pub fn runtime_info(&self) -> ControllerResult<Response> {
        self.profiler.disable();

        let body = RuntimeInfo::collect()
            .to_html()
            .map_err(|e| TemplateError::Render {
                template: "runtime_info".to_string(),
                message: e.to_string(),
            })?;
        Ok(Response::html(body))
    }
}
