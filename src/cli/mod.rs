//! Command-line interface for esdump
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and flag/config merging
//! - Validation of the export request before anything touches the cluster

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{EsdumpError, Result};

pub mod completion;

/// Export Elasticsearch documents to a delimited text file
#[derive(Parser, Debug)]
#[command(
    name = "esdump",
    version,
    about = "Export Elasticsearch documents to a delimited text file",
    long_about = "Exports documents from an Elasticsearch index into a delimited text file \
via the scan/scroll protocol, with a fixed field projection and live progress reporting."
)]
pub struct CliArgs {
    /// Elasticsearch host URL to export from
    #[arg(long, value_name = "URL")]
    pub host: Option<String>,

    /// Name of the index (or alias) to export
    #[arg(short = 'i', long, value_name = "NAME")]
    pub index: Option<String>,

    /// Mapping type inside the index to restrict the export to
    #[arg(short = 't', long = "doc-type", value_name = "NAME")]
    pub doc_type: Option<String>,

    /// Comma-separated list of fields to export, in output column order
    #[arg(short = 'f', long, value_name = "LIST")]
    pub fields: Option<String>,

    /// Output file path
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Column delimiter for the output file
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Rows written between sink flushes
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Scroll page size, per shard
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Scroll keep-alive duration, e.g. 5m
    #[arg(long, value_name = "DURATION")]
    pub scroll: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Disable progress reporting (skips the count query)
    #[arg(long)]
    pub no_progress: bool,

    /// Quiet mode (warnings and errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for esdump
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show version information
    Version,

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

/// Everything main() needs to run one export, validated and merged from
/// flags and the config file.
#[derive(Debug)]
pub struct ExportRequest {
    pub host: String,
    pub index: String,
    pub doc_type: Option<String>,
    pub fields: Vec<String>,
    pub output: PathBuf,
    pub delimiter: char,
    pub batch_size: usize,
    pub page_size: Option<u32>,
    pub scroll: String,
}

/// Parsed arguments plus the loaded configuration.
pub struct CliInterface {
    args: CliArgs,
    config: Config,
}

impl CliInterface {
    /// Parse the command line and load the configuration file.
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Config::load(args.config_file.as_deref())?;
        Ok(Self { args, config })
    }

    #[cfg(test)]
    fn from_parts(args: CliArgs, config: Config) -> Self {
        Self { args, config }
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle version/completion subcommands.
    ///
    /// # Returns
    /// * `Result<bool>` - true when a subcommand ran and the process should exit
    pub fn handle_subcommand(&self) -> Result<bool> {
        match &self.args.command {
            Some(Commands::Version) => {
                println!("esdump {}", crate::version());
                Ok(true)
            }
            Some(Commands::Completion { shell }) => {
                completion::generate_completion(shell)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Validate and merge flags with config-file defaults into one request.
    ///
    /// Required: index, fields, output. Everything else falls back to the
    /// configuration file and then to built-in defaults.
    pub fn export_request(&self) -> Result<ExportRequest> {
        let index = match self.args.index.as_deref() {
            Some(index) if !index.is_empty() => index.to_string(),
            _ => return Err(EsdumpError::Generic("missing required --index".to_string())),
        };

        let raw_fields = match self.args.fields.as_deref() {
            Some(list) if !list.is_empty() => list,
            _ => return Err(EsdumpError::Generic("missing required --fields".to_string())),
        };
        let fields = parse_fields(raw_fields)?;

        let output = match &self.args.output {
            Some(path) => path.clone(),
            None => return Err(EsdumpError::Generic("missing required --output".to_string())),
        };

        Ok(ExportRequest {
            host: self
                .args
                .host
                .clone()
                .unwrap_or_else(|| self.config.connection.default_host.clone()),
            index,
            doc_type: self.args.doc_type.clone().filter(|t| !t.is_empty()),
            fields,
            output,
            delimiter: self.args.delimiter.unwrap_or(self.config.export.delimiter),
            batch_size: self.args.batch_size.unwrap_or(self.config.export.batch_size),
            page_size: self.args.page_size.or(self.config.export.page_size),
            scroll: self
                .args
                .scroll
                .clone()
                .unwrap_or_else(|| self.config.export.scroll.clone()),
        })
    }

    /// Whether progress reporting should be active for this run.
    pub fn progress_enabled(&self) -> bool {
        !self.args.no_progress && !self.args.quiet
    }
}

/// Split a comma-separated field list, dropping surrounding whitespace.
fn parse_fields(list: &str) -> Result<Vec<String>> {
    let fields: Vec<String> = list
        .split(',')
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    if fields.is_empty() {
        return Err(EsdumpError::Generic(format!("invalid field list: '{list}'")));
    }
    Ok(fields)
}
