//! Error types for the DevSecTools client.
//!
//! # Design
//! A remote failure whose body decodes as `{"error": ...}` becomes `Remote`
//! and displays as the server's message verbatim. When the error body is
//! not valid JSON the status and a bounded snippet of the raw body land in
//! `HttpError` instead, so the caller sees what the server actually sent.

use thiserror::Error;

/// Maximum number of body bytes kept in `ApiError::HttpError`.
pub const BODY_SNIPPET_LIMIT: usize = 512;

/// Errors returned by `DevSecClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned status >= 400 with a well-formed error body.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// The server returned status >= 400 and the body was not an error object.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// Connection, DNS, TLS or read failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("request cancelled")]
    Cancelled,

    /// The configured base URL cannot be turned into a request URL.
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A batch item named a scan type the API does not offer.
    #[error("invalid batch request method: {0}")]
    InvalidMethod(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Build an `HttpError`, truncating the body on a char boundary.
    pub(crate) fn http(status: u16, body: &str) -> Self {
        let mut end = body.len().min(BODY_SNIPPET_LIMIT);
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        ApiError::HttpError {
            status,
            body: body[..end].to_string(),
        }
    }

    /// HTTP status for errors that came back from the server.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Remote { status, .. } | ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::DeadlineExceeded)
    }

    pub fn is_remote(&self) -> bool {
        self.status().is_some()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::DeadlineExceeded
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
