//! Error handling for esdump.
//!
//! Provides a single crate-wide [`Result`] alias over [`EsdumpError`], which
//! wraps the more specific error kinds (connection, export, configuration)
//! together with the underlying I/O, HTTP and JSON errors.

pub mod kinds;

pub use kinds::{ConfigError, ConnectionError, EsdumpError, ExportError, Result};
