//! Error types for groq-engineer

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the chat client
///
/// The variants fall into four families: directive syntax (`InvalidArgument`),
/// model gateway failures (`Authentication`, `RateLimit`, `Network`, `Provider`),
/// filesystem failures (`FileSystem`, `NotFound`) and sandbox failures
/// (`Execution`). Everything except `Config` is recoverable at the turn boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad directive syntax or option value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The provider rejected the API key
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The provider is throttling requests
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// Connection, timeout or body transfer failure
    #[error("Network error: {0}")]
    Network(String),

    /// Any other provider-side failure (non-success status, malformed stream)
    ///
    /// `status` is the HTTP status when the failure came from one.
    #[error("Provider error: {message}")]
    Provider { status: Option<u16>, message: String },

    /// Path could not be written or is outside the working directory
    #[error("File system error: {0}")]
    FileSystem(String),

    /// File or directory does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Sandboxed code exited non-zero, timed out or could not start
    #[error("Execution error: {0}")]
    Execution(String),

    /// Invalid startup configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Create a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a new authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Error::Authentication(msg.into())
    }

    /// Create a new rate limit error
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Error::RateLimit(msg.into())
    }

    /// Create a new network error
    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(msg.into())
    }

    /// Create a new provider error not tied to an HTTP status
    pub fn provider(msg: impl Into<String>) -> Self {
        Error::Provider {
            status: None,
            message: msg.into(),
        }
    }

    /// Create a provider error for a non-success HTTP status
    pub fn provider_status(status: u16, msg: impl Into<String>) -> Self {
        Error::Provider {
            status: Some(status),
            message: msg.into(),
        }
    }

    /// HTTP status carried by a provider error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Provider { status, .. } => *status,
            _ => None,
        }
    }

    /// Create a new file system error
    pub fn file_system(msg: impl Into<String>) -> Self {
        Error::FileSystem(msg.into())
    }

    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create a new execution error
    pub fn execution(msg: impl Into<String>) -> Self {
        Error::Execution(msg.into())
    }

    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// True for the four failure kinds a model gateway call can produce
    pub fn is_gateway_error(&self) -> bool {
        matches!(
            self,
            Error::Authentication(_)
                | Error::RateLimit(_)
                | Error::Network(_)
                | Error::Provider { .. }
        )
    }

    /// Map an I/O error on `path` onto the filesystem taxonomy
    pub(crate) fn from_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::not_found(path.to_string()),
            _ => Error::file_system(format!("{}: {}", path, err)),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(err.to_string())
    }
}
