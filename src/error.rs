//! Errors raised by the helpers themselves.
//!
//! These are the operational failures of JSON decoding, form parsing and
//! wire dumps. Where a failure maps naturally onto a client-facing status,
//! the type also implements [`HttpError`].

use http::StatusCode;

use crate::status::HttpError;

/// Errors that can occur while reading or writing JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// The body could not be decoded.
    ///
    /// `input` holds the bytes consumed from the body up to the failure,
    /// which is at most the configured body limit.
    #[error("invalid JSON data: {source}, on input: {input}")]
    Decode {
        #[source]
        source: serde_json::Error,
        input: String,
    },

    /// The value could not be serialized.
    #[error("cannot encode JSON: {0}")]
    Encode(#[source] serde_json::Error),
}

impl HttpError for JsonError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Decode { .. } => StatusCode::BAD_REQUEST,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors that can occur while parsing a url-encoded form body.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Reading the body failed.
    #[error("cannot read form body: {0}")]
    Io(#[from] std::io::Error),

    /// The body is larger than the configured limit.
    #[error("form body exceeds {limit} bytes")]
    TooLarge { limit: u64 },
}

impl HttpError for FormError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Io(_) => StatusCode::BAD_REQUEST,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

/// Errors that can occur while dumping a message in HTTP wire format.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// HTTP connection error during the encoding process.
    ///
    /// This occurs when there's a failure during the HTTP handshake
    /// or while transmitting the message through the internal pipeline.
    #[error("HTTP connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Internal synchronization error.
    ///
    /// This occurs when an internal task ends before the message has been
    /// exchanged. If you encounter this error, please report it as a bug.
    #[error("synchronization error: task ended unexpectedly")]
    Sync,

    /// Unsupported HTTP version.
    ///
    /// Only HTTP/1.0 and HTTP/1.1 are supported. HTTP/2 and HTTP/3 use
    /// binary framing and compression which make wire format serialization
    /// impractical for single messages.
    #[error("unsupported HTTP version: only HTTP/1.0 and HTTP/1.1 are supported")]
    UnsupportedVersion,

    /// Writing the dump to the destination failed.
    #[error("cannot write dump: {0}")]
    Io(#[from] std::io::Error),
}
