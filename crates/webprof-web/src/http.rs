//! Request and response types
//!
//! Just enough of an HTTP exchange for the controller: routing has already
//! happened by the time a [`Request`] gets here.

use crate::session::Session;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Content type of rendered pages
pub const CONTENT_TYPE_HTML: &str = "text/html; charset=UTF-8";

/// A file from a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-side file name
    pub name: String,
    /// File contents
    pub contents: Vec<u8>,
    /// Upload failure reported by the HTTP layer
    pub error: Option<String>,
}

impl UploadedFile {
    /// A successfully uploaded file
    #[must_use]
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
            error: None,
        }
    }

    /// An upload the HTTP layer could not complete
    #[must_use]
    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Whether the upload completed
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// An inbound request, already routed
#[derive(Default)]
pub struct Request<'s> {
    query: BTreeMap<String, String>,
    files: BTreeMap<String, UploadedFile>,
    xhr: bool,
    session: Option<&'s mut dyn Session>,
}

impl<'s> Request<'s> {
    /// An empty request with no session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from a raw query string (`a=1&b=2`)
    #[must_use]
    pub fn from_query_string(query: &str) -> Self {
        let query = url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
            .into_owned()
            .collect();
        Self {
            query,
            ..Self::default()
        }
    }

    /// Add a query parameter
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Attach an uploaded file under a form field name
    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    /// Mark the request as an `XMLHttpRequest`
    #[must_use]
    pub fn with_xhr(mut self, xhr: bool) -> Self {
        self.xhr = xhr;
        self
    }

    /// Attach the caller's session
    #[must_use]
    pub fn with_session(mut self, session: &'s mut dyn Session) -> Self {
        self.session = Some(session);
        self
    }

    /// A query parameter
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// An uploaded file by form field name
    #[must_use]
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.get(field)
    }

    /// Whether the request was made by `XMLHttpRequest`
    #[must_use]
    pub fn is_xml_http_request(&self) -> bool {
        self.xhr
    }

    /// The session, if the request carries one
    #[must_use]
    pub fn session(&self) -> Option<&(dyn Session + 's)> {
        self.session.as_deref()
    }

    /// The session, mutably
    pub fn session_mut(&mut self) -> Option<&mut (dyn Session + 's)> {
        self.session.as_deref_mut()
    }
}

/// A controller's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Vec<u8>,
}

impl Response {
    /// A rendered HTML page
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::from([("Content-Type".to_string(), CONTENT_TYPE_HTML.to_string())]),
            body: body.into().into_bytes(),
        }
    }

    /// An empty HTML page
    #[must_use]
    pub fn empty() -> Self {
        Self::html("")
    }

    /// A 302 redirect
    #[must_use]
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            headers: BTreeMap::from([("Location".to_string(), location.into())]),
            body: Vec::new(),
        }
    }

    /// A plain-text download
    #[must_use]
    pub fn attachment(body: impl Into<Vec<u8>>, filename: &str) -> Self {
        Self {
            status: 200,
            headers: BTreeMap::from([
                ("Content-Type".to_string(), "text/plain".to_string()),
                (
                    "Content-Disposition".to_string(),
                    format!("attachment; filename={filename}"),
                ),
            ]),
            body: body.into(),
        }
    }

    /// Status code
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// A header value, matched case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All headers
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Raw body
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, lossily decoded
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Redirect target, if this is a redirect
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        if self.status == 302 {
            self.header("Location")
        } else {
            None
        }
    }
}
