//! Service error types.
//!
//! Business-rule violations are value-level and carry the message shown to
//! the caller; unexpected store failures are kept separate so the HTTP layer
//! can map them to a different status code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A user, cart, product, or cart item was not found.
    #[error("{0}")]
    NotFound(String),

    /// Requested quantity exceeds the available stock.
    #[error("{0}")]
    InsufficientStock(String),

    /// The cart item belongs to another user's cart.
    #[error("{0}")]
    InvalidOwnership(String),

    /// Caller-side validation failure (bad quantity, malformed input).
    #[error("{0}")]
    InvalidInput(String),

    /// Credential or role check failed.
    #[error("{0}")]
    Unauthorized(String),

    /// Unexpected store failure, distinct from business-rule violations.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
