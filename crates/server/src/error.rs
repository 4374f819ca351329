//! Server error types.

use thiserror::Error;

/// Errors raised while admitting or servicing a connection.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server full")]
    CapacityExhausted,

    #[error("unknown client {0}")]
    UnknownClient(u32),
}
