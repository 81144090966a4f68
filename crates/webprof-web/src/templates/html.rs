//! Built-in HTML templates

use super::{Context, TemplateError, TemplateRenderer, COLLECTOR_TEMPLATE_PREFIX};
use super::{INFO_TEMPLATE, RESULTS_TEMPLATE, SEARCH_TEMPLATE, TOOLBAR_TEMPLATE};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

type RenderFn = Box<dyn Fn(&Context) -> Result<String, fmt::Error>>;

/// Renderer for the profiler's built-in pages
///
/// Any `@WebProfiler/Collector/*.html` name renders with the generic panel
/// layout; other templates must be registered.
pub struct HtmlRenderer {
    templates: BTreeMap<String, RenderFn>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer {
    /// A renderer with the built-in templates registered
    #[must_use]
    pub fn new() -> Self {
        let mut renderer = Self {
            templates: BTreeMap::new(),
        };
        renderer.register(INFO_TEMPLATE, render_info);
        renderer.register(TOOLBAR_TEMPLATE, render_toolbar);
        renderer.register(SEARCH_TEMPLATE, render_search);
        renderer.register(RESULTS_TEMPLATE, render_results);
        renderer
    }

    /// Register (or replace) a template
    pub fn register<F>(&mut self, name: impl Into<String>, render: F)
    where
        F: Fn(&Context) -> Result<String, fmt::Error> + 'static,
    {
        self.templates.insert(name.into(), Box::new(render));
    }
}

impl TemplateRenderer for HtmlRenderer {
    fn render(&self, template: &str, context: &Context) -> Result<String, TemplateError> {
        let result = if let Some(render) = self.templates.get(template) {
            render(context)
        } else if template.starts_with(COLLECTOR_TEMPLATE_PREFIX) {
            render_panel(context)
        } else {
            return Err(TemplateError::NotFound(template.to_string()));
        };

        result.map_err(|e| TemplateError::Render {
            template: template.to_string(),
            message: e.to_string(),
        })
    }

    fn exists(&self, template: &str) -> bool {
        self.templates.contains_key(template) || template.starts_with(COLLECTOR_TEMPLATE_PREFIX)
    }
}

/// Escape text for HTML element content and attribute values
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Display text of a scalar; `null` and missing values are empty
fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn field(context: &Context, key: &str) -> String {
    escape(&scalar(context.get(key)))
}

fn nested(value: Option<&Value>, key: &str) -> String {
    escape(&scalar(value.and_then(|v| v.get(key))))
}

fn page(title: &str, body: &str) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(
        out,
        "<head><meta charset=\"UTF-8\"><title>webprof - {}</title></head>",
        escape(title)
    )?;
    writeln!(out, "<body>")?;
    out.push_str(body);
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

fn render_info(context: &Context) -> Result<String, fmt::Error> {
    let about = scalar(context.get("about"));
    let (title, message) = match about.as_str() {
        "no_token" => (
            "Token not found".to_string(),
            format!(
                "Token \"{}\" was not found in the database.",
                scalar(context.get("token"))
            ),
        ),
        "purge" => (
            "The profiler database was purged successfully".to_string(),
            "Now you need to browse some pages with the profiler enabled.".to_string(),
        ),
        "upload_error" => (
            "A problem occurred when uploading the data".to_string(),
            "No file given or the file was not uploaded successfully.".to_string(),
        ),
        "already_exists" => (
            "A problem occurred when uploading the data".to_string(),
            "The token already exists in the database.".to_string(),
        ),
        _ => (
            "Unknown information".to_string(),
            format!("No information is available for \"{about}\"."),
        ),
    };

    let mut body = String::new();
    writeln!(body, "<div class=\"webprof-info\" data-about=\"{}\">", escape(&about))?;
    writeln!(body, "<h2>{}</h2>", escape(&title))?;
    writeln!(body, "<p>{}</p>", escape(&message))?;
    writeln!(body, "</div>")?;
    page(&title, &body)
}

fn panel_names(context: &Context) -> Vec<String> {
    context
        .get("templates")
        .and_then(Value::as_array)
        .map(|panels| {
            panels
                .iter()
                .filter_map(|p| p.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn render_toolbar(context: &Context) -> Result<String, fmt::Error> {
    let token = field(context, "token");
    let profile = context.get("profile");
    let profiler_url = context.get("profiler_url").and_then(Value::as_str);

    let mut out = String::new();
    writeln!(
        out,
        "<div id=\"webprof-toolbar-{token}\" class=\"webprof-toolbar webprof-toolbar-{}\" data-token=\"{token}\">",
        field(context, "position")
    )?;
    writeln!(
        out,
        "<span class=\"webprof-toolbar-request\"><b>{}</b> {} {}</span>",
        nested(profile, "status_code"),
        nested(profile, "method"),
        nested(profile, "url")
    )?;
    for name in panel_names(context) {
        let name = escape(&name);
        match profiler_url {
            Some(url) => writeln!(
                out,
                "<a class=\"webprof-toolbar-block\" href=\"{}?panel={name}\">{name}</a>",
                escape(url)
            )?,
            None => writeln!(out, "<span class=\"webprof-toolbar-block\">{name}</span>")?,
        }
    }
    if let Some(url) = profiler_url {
        writeln!(
            out,
            "<a class=\"webprof-toolbar-open\" href=\"{}\">{token}</a>",
            escape(url)
        )?;
    }
    writeln!(out, "</div>")?;
    Ok(out)
}

fn render_search(context: &Context) -> Result<String, fmt::Error> {
    let mut out = String::new();
    writeln!(out, "<form class=\"webprof-search\" method=\"get\">")?;
    for (name, label) in [
        ("ip", "IP"),
        ("method", "Method"),
        ("url", "URL"),
        ("token", "Token"),
        ("limit", "Limit"),
    ] {
        writeln!(
            out,
            "<label>{label} <input type=\"text\" name=\"{name}\" value=\"{}\"></label>",
            field(context, name)
        )?;
    }
    writeln!(out, "<button type=\"submit\">Search</button>")?;
    writeln!(out, "</form>")?;
    Ok(out)
}

fn render_results(context: &Context) -> Result<String, fmt::Error> {
    let tokens = context
        .get("tokens")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut body = String::new();
    writeln!(body, "<div class=\"webprof-results\">")?;
    writeln!(
        body,
        "<p class=\"webprof-filter\">ip: {} | method: {} | url: {} | limit: {}</p>",
        field(context, "ip"),
        field(context, "method"),
        field(context, "url"),
        field(context, "limit")
    )?;

    if tokens.is_empty() {
        writeln!(body, "<p>The query returned no result.</p>")?;
    } else {
        writeln!(body, "<h2>{} results found</h2>", tokens.len())?;
        writeln!(body, "<table>")?;
        writeln!(
            body,
            "<tr><th>Token</th><th>IP</th><th>Method</th><th>URL</th><th>Status</th><th>Time</th></tr>"
        )?;
        for entry in &tokens {
            let entry = Some(entry);
            writeln!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                nested(entry, "token"),
                nested(entry, "ip"),
                nested(entry, "method"),
                nested(entry, "url"),
                nested(entry, "status_code"),
                nested(entry, "time")
            )?;
        }
        writeln!(body, "</table>")?;
    }
    writeln!(body, "</div>")?;

    page("Search results", &body)
}

fn render_panel(context: &Context) -> Result<String, fmt::Error> {
    let panel = scalar(context.get("panel"));
    let profile = context.get("profile");

    let mut section = String::new();
    writeln!(
        section,
        "<section class=\"webprof-panel\" data-panel=\"{}\" data-page=\"{}\">",
        escape(&panel),
        field(context, "page")
    )?;
    writeln!(section, "<h2>{}</h2>", escape(&panel))?;
    section.push_str(&render_value(context.get("collector").unwrap_or(&Value::Null)));
    writeln!(section)?;
    writeln!(section, "</section>")?;

    if context.get("is_ajax").and_then(Value::as_bool) == Some(true) {
        return Ok(section);
    }

    let mut body = String::new();
    writeln!(body, "<div class=\"webprof-summary\">")?;
    writeln!(
        body,
        "<span>{}</span> <span>{}</span> <span>{}</span> <span>{}</span> <span>{}</span> <span>{}</span>",
        nested(profile, "method"),
        nested(profile, "url"),
        nested(profile, "status_code"),
        nested(profile, "ip"),
        nested(profile, "time"),
        field(context, "token")
    )?;
    writeln!(body, "</div>")?;
    writeln!(body, "<nav><ul>")?;
    for name in panel_names(context) {
        let class = if name == panel { " class=\"selected\"" } else { "" };
        writeln!(body, "<li{class}>{}</li>", escape(&name))?;
    }
    writeln!(body, "</ul></nav>")?;
    body.push_str(&section);

    page(&panel, &body)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "<em>null</em>".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => escape(v),
        Value::Array(items) => render_array(items),
        Value::Object(map) => render_object(map),
    }
}

fn render_array(items: &[Value]) -> String {
    if items.is_empty() {
        return "<em>empty</em>".to_string();
    }

    let mut out = String::from("<ul>");
    for item in items {
        out.push_str(&format!("<li>{}</li>", render_value(item)));
    }
    out.push_str("</ul>");
    out
}

fn render_object(map: &Map<String, Value>) -> String {
    if map.is_empty() {
        return "<em>empty</em>".to_string();
    }

    let mut out = String::from("<dl>");
    for (key, value) in map {
        out.push_str(&format!(
            "<dt>{}</dt><dd>{}</dd>",
            escape(key),
            render_value(value)
        ));
    }
    out.push_str("</dl>");
    out
}
