//! Swap flow error taxonomy

use dex::DexError;
use ethers::types::{Address, H256};
use perch_amm::AmmError;
use perch_types::ValidationError;
use thiserror::Error;

/// Every way a quote, swap or wallet flow can fail
///
/// Variants are `Clone` so a failure can be published as the terminal
/// [`SwapState::Failed`](crate::SwapState::Failed) value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Insufficient liquidity in pool")]
    InsufficientLiquidity,

    #[error("No V2 pair exists for token {token:?}")]
    PairNotFound { token: Address },

    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    #[error("User rejected the request")]
    UserRejected,

    #[error("Simulation reverted: {reason}")]
    SimulationReverted { reason: String },

    #[error("Session expired, login required")]
    SessionExpired,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Quote math rejected the inputs (overflow, drained pool, bad slippage)
    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error("Another swap is already in flight")]
    SwapInProgress,

    #[error("Transaction {tx_hash:?} not confirmed after {attempts} polls")]
    ConfirmationTimeout { tx_hash: H256, attempts: u32 },

    /// Stopped by the caller; `tx_hash` is set when the transaction was
    /// already broadcast and may still be mined
    #[error("Cancelled{}", .tx_hash.map(|h| format!(" after broadcast of {:?}", h)).unwrap_or_default())]
    Cancelled { tx_hash: Option<H256> },

    #[error("Transaction {tx_hash:?} was mined but reverted")]
    TransactionFailed { tx_hash: H256 },

    #[error("Missing configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<AmmError> for SwapError {
    fn from(err: AmmError) -> Self {
        match err {
            AmmError::InsufficientLiquidity => SwapError::InsufficientLiquidity,
            other => SwapError::InvalidQuote(other.to_string()),
        }
    }
}

impl From<ValidationError> for SwapError {
    fn from(err: ValidationError) -> Self {
        SwapError::InvalidAmount(err.to_string())
    }
}

impl From<DexError> for SwapError {
    fn from(err: DexError) -> Self {
        SwapError::NetworkError(format!("malformed contract data: {}", err))
    }
}

impl SwapError {
    /// Failures that happen before anything is signed
    pub fn is_pre_signature(&self) -> bool {
        !matches!(
            self,
            SwapError::ConfirmationTimeout { .. }
                | SwapError::Cancelled { tx_hash: Some(_) }
                | SwapError::TransactionFailed { .. }
        )
    }
}
