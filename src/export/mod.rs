//! Streaming export of documents to a delimited file.
//!
//! # Architecture
//!
//! The export path is built on three seams:
//!
//! 1. **[`DocumentStream`]**: page-at-a-time cursor over the source
//!    (implemented by [`ScrollStream`] over the scan/scroll protocol)
//! 2. **[`RowSink`]**: fallible row writing and flushing (implemented by
//!    [`DelimitedWriter`])
//! 3. **[`ProgressFn`]**: per-record progress callback
//!
//! The [`Exporter`] drives all three: it checks preconditions, issues the
//! optional count query, writes the header row, streams pages, converts
//! records to rows, flushes in batches, and returns an [`ExportReport`]
//! (carried inside [`ExportAborted`] when the run dies early).

pub mod driver;
pub mod progress;
pub mod streaming;
pub mod value;
pub mod writers;

pub use driver::{ExportAborted, ExportConfig, ExportReport, Exporter, RecordFailure};
pub use progress::{ProgressFn, ProgressTracker};
pub use streaming::{DocumentStream, ScrollStream};
pub use writers::{DelimitedWriter, RowSink};
