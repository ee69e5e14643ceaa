//! The export driver.
//!
//! Owns one export run end to end: precondition checks, the optional count
//! query, the scroll loop, field projection and row conversion, batched
//! sink flushes, progress callbacks, and the final [`ExportReport`].
//!
//! Error policy follows three tiers: configuration problems fail fast
//! before any I/O; a single row failing to write is logged and recorded but
//! does not stop the run; cursor and flush failures abort the run, with the
//! partial report handed back alongside the error.

use std::fmt;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn};

use crate::client::{match_all, EsClient};
use crate::error::{EsdumpError, ExportError, Result};

use super::progress::ProgressFn;
use super::streaming::{DocumentStream, ScrollStream};
use super::value::render_cell;
use super::writers::RowSink;

/// Rows written between sink flushes when not configured.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Scroll keep-alive when not configured.
pub const DEFAULT_SCROLL: &str = "5m";

/// Immutable configuration for one export run.
///
/// Built once with named fields; there is no required call ordering and no
/// observable partially-configured state. Collaborators that must be present
/// (client, sink) are constructor arguments of [`Exporter`] instead.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Index (or alias) to export from. Must be non-empty.
    pub index: String,

    /// Optional mapping types restricting the scan.
    pub types: Vec<String>,

    /// Field projection; the order defines the output column order.
    /// Must be non-empty.
    pub fields: Vec<String>,

    /// Filter predicate, passed through opaquely to count and scan.
    /// `None` means match everything.
    pub query: Option<Value>,

    /// Results per shard per scroll request. `None` leaves the server
    /// default in place.
    pub page_size: Option<u32>,

    /// Rows written between flushes. `None` means [`DEFAULT_BATCH_SIZE`].
    pub batch_size: Option<usize>,

    /// Scroll keep-alive in Elasticsearch time-unit syntax.
    /// `None` means [`DEFAULT_SCROLL`].
    pub scroll: Option<String>,
}

impl ExportConfig {
    /// Configuration with only the required parts set.
    pub fn new(index: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            index: index.into(),
            types: Vec::new(),
            fields,
            query: None,
            page_size: None,
            batch_size: None,
            scroll: None,
        }
    }
}

/// Outcome of an export run.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Rows successfully written to the sink.
    pub success: u64,

    /// Records that could not be written.
    pub failed: u64,

    /// Per-record failures, in the order they occurred.
    pub errors: Vec<RecordFailure>,
}

/// One record that failed to export.
#[derive(Debug)]
pub struct RecordFailure {
    /// Source location, `index/type/id`.
    pub location: String,

    /// What went wrong.
    pub reason: String,
}

/// A fatal abort, carrying whatever the run accomplished before failing.
#[derive(Debug)]
pub struct ExportAborted {
    /// Partial report accumulated up to the abort.
    pub partial: ExportReport,

    /// The error that terminated the run.
    pub cause: EsdumpError,
}

impl fmt::Display for ExportAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "export aborted after {} rows: {}",
            self.partial.success, self.cause
        )
    }
}

impl std::error::Error for ExportAborted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

/// Driver for one export run.
pub struct Exporter<'a> {
    client: &'a EsClient,
    config: ExportConfig,
    sink: Box<dyn RowSink>,
    progress: Option<ProgressFn>,
}

impl<'a> Exporter<'a> {
    /// Create a driver from its collaborators.
    pub fn new(client: &'a EsClient, config: ExportConfig, sink: Box<dyn RowSink>) -> Self {
        Self {
            client,
            config,
            sink,
            progress: None,
        }
    }

    /// Register a progress callback, invoked once per record with
    /// `(current, total)`. Registering one causes an extra count query at
    /// the start of the run.
    pub fn with_progress(mut self, f: ProgressFn) -> Self {
        self.progress = Some(f);
        self
    }

    /// Run the export.
    ///
    /// Always produces an [`ExportReport`]; on a fatal abort the partial
    /// report rides along inside [`ExportAborted`].
    pub async fn run(mut self) -> std::result::Result<ExportReport, ExportAborted> {
        let mut report = ExportReport::default();

        // Fail fast on unusable configuration, before any request goes out.
        if self.config.index.is_empty() {
            return Err(abort(report, ExportError::MissingIndex.into()));
        }
        if self.config.fields.is_empty() {
            return Err(abort(report, ExportError::MissingFields.into()));
        }

        let batch_size = self.config.batch_size.unwrap_or(DEFAULT_BATCH_SIZE).max(1);
        let scroll = self
            .config
            .scroll
            .clone()
            .unwrap_or_else(|| DEFAULT_SCROLL.to_string());
        let query = self.config.query.clone().unwrap_or_else(match_all);

        // The count is only worth a round trip when someone is listening.
        let total = if self.progress.is_some() {
            match self
                .client
                .count(&self.config.index, &self.config.types, &query)
                .await
            {
                Ok(n) => n,
                Err(e) => return Err(abort(report, e)),
            }
        } else {
            0
        };

        let start = Instant::now();
        info!(
            index = %self.config.index,
            fields = self.config.fields.len(),
            "starting export"
        );

        let mut stream = match ScrollStream::open(
            self.client,
            &self.config.index,
            &self.config.types,
            &query,
            &self.config.fields,
            self.config.page_size,
            &scroll,
        )
        .await
        {
            Ok(s) => s,
            Err(e) => return Err(abort(report, e)),
        };

        let outcome = drive(
            &mut stream,
            self.sink.as_mut(),
            &self.config.fields,
            batch_size,
            &mut self.progress,
            total,
            &mut report,
        )
        .await;

        match outcome {
            Ok(()) => {
                info!(
                    success = report.success,
                    failed = report.failed,
                    elapsed = ?start.elapsed(),
                    "export completed"
                );
                Ok(report)
            }
            Err(cause) => Err(abort(report, cause)),
        }
    }
}

fn abort(partial: ExportReport, cause: EsdumpError) -> ExportAborted {
    ExportAborted { partial, cause }
}

/// Run the page loop to completion, then release the cursor and perform the
/// unconditional terminal flush — also on the error path, so partial output
/// reaches the file.
async fn drive(
    stream: &mut dyn DocumentStream,
    sink: &mut dyn RowSink,
    fields: &[String],
    batch_size: usize,
    progress: &mut Option<ProgressFn>,
    total: u64,
    report: &mut ExportReport,
) -> Result<()> {
    let loop_result = export_loop(stream, sink, fields, batch_size, progress, total, report).await;

    if let Err(e) = stream.close().await {
        warn!("failed to clear scroll cursor: {e}");
    }

    match sink.flush().await {
        Ok(()) => loop_result,
        Err(flush_err) => match loop_result {
            // The loop already failed; report that error, not the flush.
            Err(cause) => {
                warn!("terminal flush also failed: {flush_err}");
                Err(cause)
            }
            Ok(()) => Err(flush_err),
        },
    }
}

/// The scan loop: header row first, then one row per record, flushing every
/// `batch_size` successful rows. Row-level write failures are absorbed into
/// the report; everything else propagates and aborts the run.
async fn export_loop(
    stream: &mut dyn DocumentStream,
    sink: &mut dyn RowSink,
    fields: &[String],
    batch_size: usize,
    progress: &mut Option<ProgressFn>,
    total: u64,
    report: &mut ExportReport,
) -> Result<()> {
    // Header goes out before any data row and is flushed immediately; a
    // sink that cannot take the header cannot take anything.
    sink.write_row(fields).await?;
    sink.flush().await?;

    let mut seen: u64 = 0;
    let mut unflushed: usize = 0;

    loop {
        let page = match stream.next_page().await? {
            Some(page) => page,
            None => break,
        };

        for hit in &page {
            if let Some(callback) = progress.as_mut() {
                seen += 1;
                callback(seen, total);
            }

            let row: Vec<String> = fields
                .iter()
                .map(|field| render_cell(field, hit.fields.get(field)))
                .collect();

            if let Err(e) = sink.write_row(&row).await {
                warn!(location = %hit.location(), "failed to write row: {e}");
                report.failed += 1;
                report.errors.push(RecordFailure {
                    location: hit.location(),
                    reason: e.to_string(),
                });
                continue;
            }

            report.success += 1;
            unflushed += 1;
            if unflushed >= batch_size {
                unflushed = 0;
                sink.flush().await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SearchHit;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;

    fn hit(id: &str, fields: &[(&str, Value)]) -> SearchHit {
        SearchHit {
            index: "customers".to_string(),
            doc_type: Some("customer".to_string()),
            id: id.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        }
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    struct MockStream {
        pages: Vec<Vec<SearchHit>>,
        current: usize,
        fail_on_page: Option<usize>,
        closed: bool,
    }

    impl MockStream {
        fn new(pages: Vec<Vec<SearchHit>>) -> Self {
            Self {
                pages,
                current: 0,
                fail_on_page: None,
                closed: false,
            }
        }

        fn failing_on_page(mut self, page: usize) -> Self {
            self.fail_on_page = Some(page);
            self
        }
    }

    #[async_trait]
    impl DocumentStream for MockStream {
        async fn next_page(&mut self) -> Result<Option<Vec<SearchHit>>> {
            if self.fail_on_page == Some(self.current) {
                return Err(ExportError::Scroll("cursor lost".to_string()).into());
            }
            if self.current < self.pages.len() {
                let page = self.pages[self.current].clone();
                self.current += 1;
                Ok(Some(page))
            } else {
                Ok(None)
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockSink {
        rows: Vec<Vec<String>>,
        /// Number of rows present at each flush call.
        flush_marks: Vec<usize>,
        /// Fail the write of the nth row (0-based, counting the header).
        fail_write_at: Option<usize>,
        /// Fail the nth flush call (0-based).
        fail_flush_at: Option<usize>,
        flushes: usize,
    }

    #[async_trait]
    impl RowSink for MockSink {
        async fn write_row(&mut self, row: &[String]) -> Result<()> {
            if self.fail_write_at == Some(self.rows.len()) {
                // Consume the trigger so later rows go through.
                self.fail_write_at = None;
                return Err(ExportError::Sink("disk hiccup".to_string()).into());
            }
            self.rows.push(row.to_vec());
            Ok(())
        }

        async fn flush(&mut self) -> Result<()> {
            if self.fail_flush_at == Some(self.flushes) {
                return Err(ExportError::Sink("flush failed".to_string()).into());
            }
            self.flushes += 1;
            self.flush_marks.push(self.rows.len());
            Ok(())
        }
    }

    async fn run_drive(
        stream: &mut MockStream,
        sink: &mut MockSink,
        field_names: &[&str],
        batch_size: usize,
        progress: &mut Option<ProgressFn>,
        total: u64,
    ) -> (ExportReport, Result<()>) {
        let mut report = ExportReport::default();
        let result = drive(
            stream,
            sink,
            &fields(field_names),
            batch_size,
            progress,
            total,
            &mut report,
        )
        .await;
        (report, result)
    }

    #[tokio::test]
    async fn test_header_then_rows_with_multi_values() {
        // Three records: one value, two values, none.
        let mut stream = MockStream::new(vec![vec![
            hit("1", &[("name", json!(["a"]))]),
            hit("2", &[("name", json!(["b", "c"]))]),
            hit("3", &[("name", json!([]))]),
        ]]);
        let mut sink = MockSink::default();

        let (report, result) =
            run_drive(&mut stream, &mut sink, &["name"], 500, &mut None, 0).await;

        result.unwrap();
        assert_eq!(report.success, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(
            sink.rows,
            vec![
                vec!["name".to_string()],
                vec!["a".to_string()],
                vec!["b\nc".to_string()],
                vec!["".to_string()],
            ]
        );
        assert!(stream.closed);
    }

    #[tokio::test]
    async fn test_missing_field_renders_empty_cell() {
        let mut stream = MockStream::new(vec![vec![hit(
            "1",
            &[("name", json!(["x"]))],
        )]]);
        let mut sink = MockSink::default();

        let (_, result) =
            run_drive(&mut stream, &mut sink, &["name", "email"], 500, &mut None, 0).await;

        result.unwrap();
        assert_eq!(sink.rows[1], vec!["x".to_string(), "".to_string()]);
    }

    #[tokio::test]
    async fn test_flush_cadence_and_terminal_flush() {
        let records: Vec<SearchHit> = (0..5)
            .map(|i| hit(&i.to_string(), &[("name", json!(["v"]))]))
            .collect();
        let mut stream = MockStream::new(vec![records]);
        let mut sink = MockSink::default();

        let (report, result) =
            run_drive(&mut stream, &mut sink, &["name"], 2, &mut None, 0).await;

        result.unwrap();
        assert_eq!(report.success, 5);
        // Header flush, after rows 2 and 4, then the terminal flush.
        assert_eq!(sink.flush_marks, vec![1, 3, 5, 6]);
    }

    #[tokio::test]
    async fn test_terminal_flush_even_when_batch_just_flushed() {
        let records: Vec<SearchHit> = (0..4)
            .map(|i| hit(&i.to_string(), &[("name", json!(["v"]))]))
            .collect();
        let mut stream = MockStream::new(vec![records]);
        let mut sink = MockSink::default();

        let (_, result) = run_drive(&mut stream, &mut sink, &["name"], 2, &mut None, 0).await;

        result.unwrap();
        // Even though row 4 triggered a batch flush, one more terminal
        // flush still happens.
        assert_eq!(sink.flush_marks, vec![1, 3, 5, 5]);
    }

    #[tokio::test]
    async fn test_empty_source_writes_only_header() {
        let mut stream = MockStream::new(vec![]);
        let mut sink = MockSink::default();

        let (report, result) =
            run_drive(&mut stream, &mut sink, &["name"], 500, &mut None, 0).await;

        result.unwrap();
        assert_eq!(report.success, 0);
        assert_eq!(sink.rows, vec![vec!["name".to_string()]]);
    }

    #[tokio::test]
    async fn test_row_write_failure_is_absorbed() {
        let mut stream = MockStream::new(vec![vec![
            hit("1", &[("name", json!(["a"]))]),
            hit("2", &[("name", json!(["b"]))]),
            hit("3", &[("name", json!(["c"]))]),
        ]]);
        let mut sink = MockSink {
            fail_write_at: Some(2), // second data row
            ..Default::default()
        };

        let (report, result) =
            run_drive(&mut stream, &mut sink, &["name"], 500, &mut None, 0).await;

        result.unwrap();
        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].location, "customers/customer/2");
        // Record 2 is absent, record 3 still made it.
        assert_eq!(
            sink.rows,
            vec![
                vec!["name".to_string()],
                vec!["a".to_string()],
                vec!["c".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn test_flush_failure_aborts() {
        let records: Vec<SearchHit> = (0..10)
            .map(|i| hit(&i.to_string(), &[("name", json!(["v"]))]))
            .collect();
        let mut stream = MockStream::new(vec![records]);
        let mut sink = MockSink {
            fail_flush_at: Some(1), // first batch flush after the header's
            ..Default::default()
        };

        let (report, result) =
            run_drive(&mut stream, &mut sink, &["name"], 3, &mut None, 0).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("flush failed"));
        // Three rows were written before the failing flush; nothing after.
        assert_eq!(report.success, 3);
        assert_eq!(sink.rows.len(), 4); // header + 3
        assert!(stream.closed);
    }

    #[tokio::test]
    async fn test_cursor_error_returns_partial_report() {
        let mut stream = MockStream::new(vec![
            vec![hit("1", &[("name", json!(["a"]))])],
            vec![hit("2", &[("name", json!(["b"]))])],
        ])
        .failing_on_page(1);
        let mut sink = MockSink::default();

        let (report, result) =
            run_drive(&mut stream, &mut sink, &["name"], 500, &mut None, 0).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("cursor lost"));
        assert_eq!(report.success, 1);
        assert!(stream.closed);
        // Terminal flush still ran on the error path.
        assert_eq!(sink.flush_marks.last(), Some(&2));
    }

    #[tokio::test]
    async fn test_progress_called_per_record_in_order() {
        let pages = vec![
            (0..4)
                .map(|i| hit(&i.to_string(), &[("name", json!(["v"]))]))
                .collect::<Vec<_>>(),
            (4..10)
                .map(|i| hit(&i.to_string(), &[("name", json!(["v"]))]))
                .collect::<Vec<_>>(),
        ];
        let mut stream = MockStream::new(pages);
        let mut sink = MockSink::default();

        let calls = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = std::sync::Arc::clone(&calls);
        let mut progress: Option<ProgressFn> = Some(Box::new(move |current, total| {
            recorded.lock().unwrap().push((current, total));
        }));

        let (_, result) =
            run_drive(&mut stream, &mut sink, &["name"], 500, &mut progress, 10).await;

        result.unwrap();
        let calls = calls.lock().unwrap();
        let expected: Vec<(u64, u64)> = (1..=10).map(|i| (i, 10)).collect();
        assert_eq!(*calls, expected);
    }

    #[tokio::test]
    async fn test_run_fails_fast_on_missing_index() {
        let client =
            EsClient::new("http://127.0.0.1:1", std::time::Duration::from_secs(1)).unwrap();
        let config = ExportConfig::new("", fields(&["name"]));
        let exporter = Exporter::new(&client, config, Box::new(MockSink::default()));

        let aborted = exporter.run().await.unwrap_err();
        assert!(matches!(
            aborted.cause,
            EsdumpError::Export(ExportError::MissingIndex)
        ));
        assert_eq!(aborted.partial.success, 0);
    }

    #[tokio::test]
    async fn test_run_fails_fast_on_missing_fields() {
        // Port 1 would refuse instantly if anything tried to connect; the
        // precondition must trip before any request is attempted.
        let client =
            EsClient::new("http://127.0.0.1:1", std::time::Duration::from_secs(1)).unwrap();
        let config = ExportConfig::new("customers", Vec::new());
        let exporter = Exporter::new(&client, config, Box::new(MockSink::default()));

        let aborted = exporter.run().await.unwrap_err();
        assert!(matches!(
            aborted.cause,
            EsdumpError::Export(ExportError::MissingFields)
        ));
    }

    #[test]
    fn test_config_defaults() {
        let config = ExportConfig::new("idx", fields(&["a"]));
        assert!(config.types.is_empty());
        assert!(config.query.is_none());
        assert!(config.batch_size.is_none());
        assert!(config.scroll.is_none());
        assert!(config.page_size.is_none());
    }
}
