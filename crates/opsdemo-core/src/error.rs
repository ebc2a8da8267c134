//! Shared error type across opsdemo crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Requested resource does not exist.
    NotFound,
    /// Unsupported configuration version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status code this client code is reported with.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => 400,
            ClientCode::NotFound => 404,
            ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, OpsError>;

/// Unified error type used by core and api.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("metric series limit reached ({0})")]
    SeriesLimit(usize),
    #[error("internal: {0}")]
    Internal(String),
}

impl OpsError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            OpsError::BadRequest(_) => ClientCode::BadRequest,
            OpsError::NotFound(_) => ClientCode::NotFound,
            OpsError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            OpsError::SeriesLimit(_) | OpsError::Internal(_) => ClientCode::Internal,
        }
    }
}
