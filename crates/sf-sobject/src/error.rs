//! Error types for sf-sobject.

/// Result type alias for sf-sobject operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-sobject operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Caller input was missing or malformed.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation(message.into()))
    }

    /// A lookup matched no record.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(message.into()))
    }

    /// The storage lacks configuration an operation needs.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented(message.into()))
    }

    /// The transport error, if this failure came from the connection.
    pub fn remote(&self) -> Option<&busbar_sf_client::Error> {
        match &self.kind {
            ErrorKind::Remote(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of the remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        self.remote().and_then(busbar_sf_client::Error::status)
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Caller input was missing or malformed. Raised before any request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// `get` matched no record.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Object name or property map was never configured.
    #[error("Not implemented: {0}")]
    NotImplemented(String),

    /// A response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Failure reported by the connection, kept as is.
    #[error(transparent)]
    Remote(busbar_sf_client::Error),
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        Error::new(ErrorKind::Remote(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::UnexpectedResponse(err.to_string()), err)
    }
}
