//! Error types for quote, slippage and price calculations

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmmError {
    /// One side of the pool is empty
    #[error("Insufficient liquidity: reserves must be non-zero")]
    InsufficientLiquidity,

    /// Requested output drains the pool
    #[error("Requested output {amount_out} is not below reserve {reserve_out}")]
    ExcessiveOutput {
        amount_out: String,
        reserve_out: String,
    },

    /// Intermediate product left the 256-bit range
    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Slippage tolerance outside [0, 100)
    #[error("Slippage tolerance {0}% must be at least 0 and below 100")]
    InvalidSlippage(String),

    /// Token decimals too large to scale for display
    #[error("Unsupported decimal scale {0}")]
    InvalidDecimals(u8),
}
