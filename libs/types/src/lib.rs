//! # Perch Types Library
//!
//! Shared data model for the Perch swap widget back-end.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: every on-chain quantity is a `U256` in smallest units
//! - **Clear Boundaries**: floating point only appears in display values such as
//!   [`TokenData::price`]
//! - **Ephemeral Snapshots**: [`ReservePair`] and [`Quote`] are recomputed per call
//!   and carry no caching semantics
//!
//! ## Quick Start
//!
//! ```rust
//! use perch_types::{SwapDirection, SwapRequest};
//! use rust_decimal::Decimal;
//!
//! let request = SwapRequest {
//!     token_address: "0x6b175474e89094c44da98b954eedeac495271d0f".parse().unwrap(),
//!     amount: "1000000000000000000".to_string(),
//!     slippage_percent: Decimal::new(5, 1),
//!     token_decimals: 18,
//! };
//! assert_eq!(request.amount_in().unwrap().to_string(), "1000000000000000000");
//! assert_eq!(SwapDirection::Buy.to_string(), "buy");
//! ```

pub mod common;
pub mod session;
pub mod swap;

pub use common::errors::ValidationError;
pub use session::Credential;
pub use swap::{Quote, ReservePair, SwapDirection, SwapRequest, TokenData, TxReceipt};

/// Re-exported so downstream crates agree on a single 256-bit integer type
pub use ethers_core::types::{Address, H256, U256};
