//! webprof web - the profiler's pages
//!
//! [`ProfilerController`] answers the profiler's routes: panels, the debug
//! toolbar, search, import/export and purge. It is framework-agnostic; the
//! hosting server hands it a [`Request`] and writes back the [`Response`].

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod routing;
pub mod runtime;
pub mod search;
pub mod session;
pub mod templates;

pub use config::{ConfigError, ProfilerConfig, CONFIG_FILE};
pub use controller::{ProfilerController, EMPTY_RESULTS_TOKEN};
pub use error::{ControllerError, ControllerResult};
pub use http::{Request, Response, UploadedFile};
pub use routing::{RouteError, RouteTable, UrlGenerator};
pub use runtime::RuntimeInfo;
pub use search::SearchFilter;
pub use session::{FileSession, FlashBag, FlashMode, MemorySession, Session, SessionError};
pub use templates::{HtmlRenderer, TemplateError, TemplateManager, TemplateRenderer};
