//! Error types for encoding and decoding export payloads.

use thiserror::Error;

/// Errors raised while encoding or decoding wire payloads.
///
/// A payload that fails to decode cannot be trusted, so transports treat
/// every variant as fatal for the connection that carried it.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Binary (bincode) encoding or decoding failed.
    #[error("binary codec error: {0}")]
    Binary(#[from] bincode::Error),

    /// JSON encoding or decoding failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// A compact span buffer ended before the declared content.
    #[error("compact span buffer truncated: needed {needed} more bytes at offset {offset}")]
    Truncated { offset: usize, needed: usize },

    /// A compact span buffer carried an unknown span kind tag.
    #[error("compact span buffer has invalid span kind tag {0}")]
    InvalidSpanKind(u8),

    /// A compact span buffer carried a span name that is not UTF-8.
    #[error("compact span buffer has non-utf8 span name")]
    InvalidName(#[from] std::string::FromUtf8Error),
}
