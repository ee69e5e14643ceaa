use std::{fmt, io};

/// Crate-wide `Result` type using [`EsdumpError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, EsdumpError>;

/// Top-level error type for esdump operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum EsdumpError {
    /// Connection and cluster-request errors.
    Connection(ConnectionError),

    /// Export-run errors.
    Export(ExportError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// HTTP transport errors.
    Http(reqwest::Error),

    /// JSON encoding/decoding errors.
    Json(serde_json::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// The configured host is not a valid URL.
    InvalidHost(String),

    /// Failed to reach the cluster at all.
    ConnectionFailed(String),

    /// The cluster answered with a non-success status.
    RequestFailed { status: u16, body: String },

    /// The cluster answered with a body we could not interpret.
    UnexpectedResponse(String),
}

/// Export-specific errors.
#[derive(Debug)]
pub enum ExportError {
    /// No index identifier was configured.
    MissingIndex,

    /// The field projection list is empty.
    MissingFields,

    /// The row sink failed to write or flush.
    Sink(String),

    /// The scroll cursor misbehaved (e.g. no continuation token).
    Scroll(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for EsdumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EsdumpError::Connection(e) => write!(f, "Connection error: {e}"),
            EsdumpError::Export(e) => write!(f, "Export error: {e}"),
            EsdumpError::Config(e) => write!(f, "Configuration error: {e}"),
            EsdumpError::Io(e) => write!(f, "I/O error: {e}"),
            EsdumpError::Http(e) => write!(f, "HTTP error: {e}"),
            EsdumpError::Json(e) => write!(f, "JSON error: {e}"),
            EsdumpError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::InvalidHost(host) => write!(f, "Invalid host URL: {host}"),
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::RequestFailed { status, body } => {
                write!(f, "Request failed with status {status}: {body}")
            }
            ConnectionError::UnexpectedResponse(msg) => {
                write!(f, "Unexpected response: {msg}")
            }
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::MissingIndex => write!(f, "no source index"),
            ExportError::MissingFields => write!(f, "no fields"),
            ExportError::Sink(msg) => write!(f, "Sink failed: {msg}"),
            ExportError::Scroll(msg) => write!(f, "Scroll cursor failed: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for EsdumpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EsdumpError::Io(e) => Some(e),
            EsdumpError::Http(e) => Some(e),
            EsdumpError::Json(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for ConnectionError {}
impl std::error::Error for ExportError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to EsdumpError ========================= */

impl From<io::Error> for EsdumpError {
    fn from(err: io::Error) -> Self {
        EsdumpError::Io(err)
    }
}

impl From<reqwest::Error> for EsdumpError {
    fn from(err: reqwest::Error) -> Self {
        EsdumpError::Http(err)
    }
}

impl From<serde_json::Error> for EsdumpError {
    fn from(err: serde_json::Error) -> Self {
        EsdumpError::Json(err)
    }
}

impl From<ConnectionError> for EsdumpError {
    fn from(err: ConnectionError) -> Self {
        EsdumpError::Connection(err)
    }
}

impl From<ExportError> for EsdumpError {
    fn from(err: ExportError) -> Self {
        EsdumpError::Export(err)
    }
}

impl From<ConfigError> for EsdumpError {
    fn from(err: ConfigError) -> Self {
        EsdumpError::Config(err)
    }
}

impl From<String> for EsdumpError {
    fn from(msg: String) -> Self {
        EsdumpError::Generic(msg)
    }
}

impl From<&str> for EsdumpError {
    fn from(msg: &str) -> Self {
        EsdumpError::Generic(msg.to_owned())
    }
}
