//! CLI command handlers
//!
//! `record` captures profiles; `page` drives the profiler controller.

pub mod page;
pub mod record;
