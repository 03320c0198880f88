//! Errors raised while encoding calls or decoding return data

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DexError {
    /// ABI JSON, function lookup or token encoding failed
    #[error("ABI error: {0}")]
    Abi(#[from] ethers_core::abi::Error),

    /// Return data decoded but had an unexpected shape
    #[error("Unexpected return data for {function}: {reason}")]
    UnexpectedOutput {
        function: &'static str,
        reason: String,
    },
}

impl DexError {
    pub(crate) fn unexpected(function: &'static str, reason: impl Into<String>) -> Self {
        DexError::UnexpectedOutput {
            function,
            reason: reason.into(),
        }
    }
}
