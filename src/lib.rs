//! esdump — bulk export of Elasticsearch documents to delimited text files.
//!
//! The library behind the `esdump` binary. It reads documents from an index
//! through the scan/scroll protocol, projects a fixed list of fields, and
//! streams one row per document to a delimited file with batched flushing
//! and live progress reporting.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `client`: Elasticsearch HTTP client (count, scroll, existence checks)
//! - `config`: Configuration file management
//! - `error`: Error types and handling
//! - `export`: The export driver, cursor stream, rendering and sinks
//!
//! # Example
//!
//! ```no_run
//! use esdump::client::EsClient;
//! use esdump::export::{DelimitedWriter, ExportConfig, Exporter};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EsClient::new("http://127.0.0.1:9200", Duration::from_secs(30))?;
//!     let sink = DelimitedWriter::create("customers.csv", ';').await?;
//!
//!     let config = ExportConfig::new(
//!         "customers",
//!         vec!["name".to_string(), "email".to_string()],
//!     );
//!
//!     let report = Exporter::new(&client, config, Box::new(sink)).run().await?;
//!     println!("exported {} documents", report.success);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;

// Re-export commonly used types
pub use client::EsClient;
pub use config::Config;
pub use error::{EsdumpError, Result};
pub use export::{ExportConfig, ExportReport, Exporter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
