//! Delimited text writer.
//!
//! Writes one line per row, cells joined by a configurable delimiter.
//! Cells containing the delimiter, a quote or a line break are quoted
//! CSV-style with internal quotes doubled, so multi-valued cells (which
//! embed newlines) survive a round trip through standard CSV readers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::{ExportError, Result};

use super::{create_writer, validate_path, RowSink};

/// Buffered file-backed sink producing delimiter-separated rows.
pub struct DelimitedWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    delimiter: char,
    rows_written: u64,
}

impl DelimitedWriter {
    /// Create the output file and a writer over it.
    pub async fn create<P: AsRef<Path>>(path: P, delimiter: char) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        validate_path(&path)?;
        let writer = create_writer(&path).await?;

        debug!(path = %path.display(), delimiter = %delimiter, "created delimited writer");

        Ok(Self {
            writer,
            path,
            delimiter,
            rows_written: 0,
        })
    }

    /// Quote a cell if it contains the delimiter, a quote, or a line break.
    fn escape_cell(&self, cell: &str) -> String {
        if cell.contains(self.delimiter)
            || cell.contains('"')
            || cell.contains('\n')
            || cell.contains('\r')
        {
            format!("\"{}\"", cell.replace('"', "\"\""))
        } else {
            cell.to_string()
        }
    }
}

#[async_trait]
impl RowSink for DelimitedWriter {
    async fn write_row(&mut self, row: &[String]) -> Result<()> {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            line.push_str(&self.escape_cell(cell));
        }
        line.push('\n');

        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ExportError::Sink(format!("failed to write row: {e}")))?;

        self.rows_written += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .await
            .map_err(|e| ExportError::Sink(format!("failed to flush {}: {e}", self.path.display())))?;
        debug!(rows = self.rows_written, "flushed sink");
        Ok(())
    }
}
