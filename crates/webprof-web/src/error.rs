//! Error types for controller operations

use crate::routing::RouteError;
use crate::templates::TemplateError;
use thiserror::Error;
use webprof_core::ProfilerError;

/// Result type for controller operations
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors a controller entry point can surface to the HTTP layer
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Unknown token or panel; maps to a 404
    #[error("{0}")]
    NotFound(String),

    /// Profile storage or codec failure
    #[error(transparent)]
    Profiler(#[from] ProfilerError),

    /// Template lookup or rendering failure
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// URL generation failure
    #[error(transparent)]
    Routing(#[from] RouteError),
}

impl ControllerError {
    /// HTTP status code the error should be answered with
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }
}
