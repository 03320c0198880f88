//! Error types for request validation
//!
//! Raised when a value arriving from the widget cannot be turned into the
//! integer quantities the swap flow works with.

use thiserror::Error;

/// Errors that can occur while validating a swap request
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Amount is not a non-negative base-10 integer string
    #[error("Invalid amount '{input}': expected an integer in smallest token units")]
    InvalidAmount { input: String },

    /// Amount parsed but is zero
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// Unknown swap direction label
    #[error("Invalid swap direction '{0}': expected 'buy' or 'sell'")]
    InvalidDirection(String),
}
