//! # Perch AMM Library - Constant-Product Quote Engine
//!
//! ## Purpose
//!
//! Integer-exact pricing for buying and selling an ERC-20 token against a
//! WETH reserve pool. Everything that feeds a transaction is computed in
//! `U256` with floor division; floating point is confined to the display
//! price in [`price`].
//!
//! ## Components
//!
//! - [`v2_math`]: `quote_output` / `quote_input` with the fixed 0.3% LP fee
//! - [`slippage`]: turns a possibly fractional slippage percentage into an
//!   integer minimum-output bound
//! - [`price`]: cross-ratio token price through a base/stable pool
//!
//! ## Rounding Policy
//!
//! ```text
//! quote_output  floor            trader may receive less than the true value
//! quote_input   floor + 1        pool never under-receives
//! min_acceptable floor           bound never exceeds the scaled output
//! ```

pub mod error;
pub mod price;
pub mod slippage;
pub mod v2_math;

pub use error::AmmError;
pub use price::{to_display_units, token_price, token_price_with_scales, PriceScales};
pub use slippage::{basis_points_multiplier, min_acceptable, validate_slippage};
pub use v2_math::{V2Math, V2PoolState, FEE_DENOMINATOR, FEE_NUMERATOR};

/// Common types for AMM calculations
pub use perch_types::U256;
pub use rust_decimal::Decimal;
