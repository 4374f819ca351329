//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or encoding wire messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed JSON message: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("invalid color literal: {0:?}")]
    InvalidColor(String),
}
