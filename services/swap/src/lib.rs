//! # Perch Swap Service
//!
//! Buys and sells an ERC-20 token against its WETH pool through a custodial
//! swap contract, using the user's own wallet for signatures.
//!
//! ## Architecture
//!
//! ```text
//! ReserveReader ──► perch_amm quote + slippage bound ──► SwapOrchestrator
//!      │                                                   │        │
//!  ChainReader (eth_call)                       WalletProvider   ReceiptSource
//!      │                                        (EIP-1193)        (bounded poll)
//!  EthersNode ◄────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`node`]: `ChainReader` / `ReceiptSource` traits and the ethers-backed node
//! - [`reserves`]: pair resolution and oriented reserve snapshots
//! - [`wallet`]: `WalletProvider` capability, EIP-1193 adapter, HTTP transport
//! - [`receipt`]: backoff polling with cancellation
//! - [`orchestrator`]: the swap state machine plus approve and deposit flows
//! - [`token_data`]: balances, metadata, allowance and display price
//! - [`testing`]: in-memory node and wallet doubles

pub mod contracts;
pub mod error;
pub mod logging;
pub mod node;
pub mod orchestrator;
pub mod receipt;
pub mod reserves;
pub mod testing;
pub mod token_data;
pub mod wallet;

pub use contracts::Contracts;
pub use error::SwapError;
pub use node::{ChainReader, ContractCall, EthersNode, ReceiptSource};
pub use orchestrator::{compute_quote, swap_call, SwapOrchestrator, SwapState};
pub use receipt::{wait_for_receipt, PollPolicy};
pub use reserves::ReserveReader;
pub use token_data::TokenDataReader;
pub use wallet::{Eip1193Transport, Eip1193Wallet, HttpTransport, ProviderRpcError, WalletProvider};
