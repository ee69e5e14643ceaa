//! Row sinks for export runs.
//!
//! [`RowSink`] is the driver's writing seam: one fallible call per row and a
//! fallible flush. [`DelimitedWriter`] is the only production sink — the
//! tool deliberately supports a single output format.

use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::BufWriter;

use crate::error::{ExportError, Result};

pub mod delimited;

pub use delimited::DelimitedWriter;

/// Trait for writing rows of string cells to an output.
#[async_trait]
pub trait RowSink: Send {
    /// Write one row. The cell order is the configured field order.
    async fn write_row(&mut self, row: &[String]) -> Result<()>;

    /// Flush buffered rows to the underlying output.
    async fn flush(&mut self) -> Result<()>;
}

/// Create a buffered file writer for a sink.
pub(crate) async fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .await
        .map_err(|e| ExportError::Sink(format!("failed to create {}: {e}", path.display())))?;
    Ok(BufWriter::with_capacity(512 * 1024, file))
}

/// Reject paths whose parent directory does not exist, so the failure
/// surfaces before the export starts instead of at the first flush.
pub(crate) fn validate_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ExportError::Sink(format!(
                "directory does not exist: {}",
                parent.display()
            ))
            .into());
        }
    }
    Ok(())
}
