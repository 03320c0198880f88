//! Shared DEX functionality library
//!
//! Canonical ABIs and calldata codecs for every contract the swap widget
//! touches, so services never hand-assemble calldata.
//!
//! # Architecture
//!
//! ```text
//! libs/dex/
//! ├── abi/
//! │   ├── uniswap_v2.rs   # V2 factory getPair, pair getReserves
//! │   ├── erc20.rs        # balanceOf, symbol, decimals, allowance, approve
//! │   └── swap_router.rs  # custodial swap contract buy/sell entry points
//! ├── selectors.rs        # 4-byte selector constants
//! └── revert.rs           # Error(string) / Panic(uint256) decoding
//! ```
//!
//! # Design Principles
//! - Single canonical source for contract ABIs
//! - Decoders validate output shape and return typed values

pub mod abi;
pub mod error;
pub mod revert;
pub mod selectors;

pub use abi::{erc20, swap_router, uniswap_v2};
pub use error::DexError;
pub use revert::decode_revert_reason;
