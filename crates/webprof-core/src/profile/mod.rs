//! Profile types and operations

pub mod collector;
pub mod export;
mod types;

pub use collector::{DataCollector, RequestSnapshot};
pub use export::{ExportError, ProfileExport};
pub use types::*;
