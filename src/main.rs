//! esdump - Elasticsearch bulk export
//!
//! Exports documents from an Elasticsearch index to a delimited text file
//! using the scan/scroll protocol.
//!
//! # Usage
//!
//! ```bash
//! esdump --host http://127.0.0.1:9200 -i customers -f name,email -o customers.csv
//! ```

use std::sync::Arc;
use tracing::{info, warn, Level};

use esdump::cli::{CliInterface, ExportRequest};
use esdump::client::EsClient;
use esdump::error::{EsdumpError, Result};
use esdump::export::{DelimitedWriter, ExportConfig, Exporter, ProgressTracker};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// This function orchestrates the application startup:
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or run the export
///
/// # Returns
/// * `Result<()>` - Success or error
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand()? {
        return Ok(());
    }

    let request = match cli.export_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'esdump --help' for usage.");
            std::process::exit(2);
        }
    };

    run_export(&cli, request).await
}

/// Connect to the cluster, verify the source exists, and drive the export.
async fn run_export(cli: &CliInterface, request: ExportRequest) -> Result<()> {
    let client = EsClient::new(&request.host, cli.config().request_timeout())?;

    let cluster = client.ping().await?;
    info!(
        cluster = %cluster.cluster_name,
        version = %cluster.version.number,
        "connected to {}", request.host
    );

    verify_source(&client, &request).await?;

    let sink = DelimitedWriter::create(&request.output, request.delimiter).await?;

    let mut config = ExportConfig::new(request.index.clone(), request.fields.clone());
    config.types = request.doc_type.clone().into_iter().collect();
    config.page_size = request.page_size;
    config.batch_size = Some(request.batch_size);
    config.scroll = Some(request.scroll.clone());

    let mut exporter = Exporter::new(&client, config, Box::new(sink));

    let tracker = if cli.progress_enabled() {
        let tracker = Arc::new(ProgressTracker::new(true));
        let t = Arc::clone(&tracker);
        exporter = exporter.with_progress(Box::new(move |current, total| t.update(current, total)));
        Some(tracker)
    } else {
        None
    };

    let outcome = exporter.run().await;

    if let Some(tracker) = &tracker {
        tracker.finish();
    }

    match outcome {
        Ok(report) => {
            info!(
                success = report.success,
                failed = report.failed,
                output = %request.output.display(),
                "export complete"
            );
            for failure in &report.errors {
                warn!(location = %failure.location, "row not exported: {}", failure.reason);
            }
            Ok(())
        }
        Err(aborted) => {
            for failure in &aborted.partial.errors {
                warn!(location = %failure.location, "row not exported: {}", failure.reason);
            }
            warn!(
                success = aborted.partial.success,
                failed = aborted.partial.failed,
                "export aborted; partial output left at {}",
                request.output.display()
            );
            Err(aborted.cause)
        }
    }
}

/// Fail before opening the sink when the index or mapping type is missing.
async fn verify_source(client: &EsClient, request: &ExportRequest) -> Result<()> {
    if !client.index_exists(&request.index).await? {
        return Err(EsdumpError::Generic(format!(
            "index '{}' does not exist",
            request.index
        )));
    }
    if let Some(doc_type) = &request.doc_type {
        if !client.type_exists(&request.index, doc_type).await? {
            return Err(EsdumpError::Generic(format!(
                "type '{}' does not exist in index '{}'",
                doc_type, request.index
            )));
        }
    }
    Ok(())
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else if cli.args().quiet {
        Level::WARN
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
