//! Error taxonomy
//!
//! Every fallible operation surfaces one of these kinds. The wire (REST body
//! and WS ERROR frame) carries the `kind()` string, never a Rust type name.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("insufficient balance: required {required} {asset}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: String,
        available: String,
    },

    #[error("not found")]
    NotFound,

    #[error("forbidden: order belongs to another session")]
    Forbidden,

    #[error("fill-or-kill order cannot be filled in full")]
    FokUnfillable,

    #[error("rate limit exceeded")]
    RateLimited {
        /// Seconds until the session may retry; None for a permanent ban
        retry_after: Option<u64>,
        violation_count: u32,
    },

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ExchangeError {
    /// Stable wire identifier for this error
    pub fn kind(&self) -> &'static str {
        match self {
            ExchangeError::UnknownSymbol(_) => "UNKNOWN_SYMBOL",
            ExchangeError::InvalidOrder(_) => "INVALID_ORDER",
            ExchangeError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            ExchangeError::NotFound => "NOT_FOUND",
            ExchangeError::Forbidden => "FORBIDDEN",
            ExchangeError::FokUnfillable => "FOK_UNFILLABLE",
            ExchangeError::RateLimited { .. } => "RATE_LIMITED",
            ExchangeError::Malformed(_) => "MALFORMED",
            ExchangeError::UnknownMessageType(_) => "UNKNOWN_MESSAGE_TYPE",
            ExchangeError::Internal(_) => "INTERNAL",
        }
    }
}
