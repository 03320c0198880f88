//! Swap data model: reserve snapshots, requests, quotes and receipts

use ethers_core::types::{Address, H256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::errors::ValidationError;

/// Two-sided liquidity snapshot of a token/base pool at the moment of read
///
/// `token_reserves` always refers to the traded token regardless of which
/// pair slot held it on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservePair {
    pub token_reserves: U256,
    pub base_reserves: U256,
}

impl ReservePair {
    pub fn new(token_reserves: U256, base_reserves: U256) -> Self {
        Self {
            token_reserves,
            base_reserves,
        }
    }

    /// Build a snapshot from raw `getReserves()` slots
    ///
    /// The AMM stores the numerically lower address in slot 0, so the token
    /// lives in slot 0 exactly when `token < base`.
    pub fn from_slots(reserve0: U256, reserve1: U256, token: Address, base: Address) -> Self {
        if token < base {
            Self::new(reserve0, reserve1)
        } else {
            Self::new(reserve1, reserve0)
        }
    }

    /// `(reserve_in, reserve_out)` for a swap in the given direction
    pub fn oriented(&self, direction: SwapDirection) -> (U256, U256) {
        match direction {
            SwapDirection::Buy => (self.base_reserves, self.token_reserves),
            SwapDirection::Sell => (self.token_reserves, self.base_reserves),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.token_reserves.is_zero() || self.base_reserves.is_zero()
    }
}

/// Which side of the pool the user spends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapDirection {
    /// Spend base currency, receive the token
    Buy,
    /// Spend the token, receive base currency
    Sell,
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::Buy => write!(f, "buy"),
            SwapDirection::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for SwapDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(SwapDirection::Buy),
            "sell" => Ok(SwapDirection::Sell),
            other => Err(ValidationError::InvalidDirection(other.to_string())),
        }
    }
}

/// A single user swap action, consumed once by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub token_address: Address,
    /// Input amount in smallest units of the input currency, as a decimal integer string
    pub amount: String,
    /// Slippage tolerance in percent; may carry fractional digits (e.g. 0.25)
    #[serde(rename = "slippage")]
    pub slippage_percent: Decimal,
    #[serde(rename = "decimals")]
    pub token_decimals: u8,
}

impl SwapRequest {
    /// Parse `amount` without ever passing through floating point
    pub fn amount_in(&self) -> Result<U256, ValidationError> {
        let trimmed = self.amount.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidAmount {
                input: self.amount.clone(),
            });
        }
        let amount = U256::from_dec_str(trimmed).map_err(|_| ValidationError::InvalidAmount {
            input: self.amount.clone(),
        })?;
        if amount.is_zero() {
            return Err(ValidationError::ZeroAmount);
        }
        Ok(amount)
    }
}

/// Derived, never-cached quote for one direction of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub direction: SwapDirection,
    pub amount_in: U256,
    pub amount_out: U256,
    /// Lowest output the swap contract may deliver before reverting
    pub amount_out_min: U256,
}

/// Mined transaction receipt, reduced to what the swap flow reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: H256,
    pub block_number: Option<u64>,
    /// 1 = success, 0 = reverted, `None` on pre-Byzantium chains
    pub status: Option<u64>,
}

impl TxReceipt {
    pub fn succeeded(&self) -> bool {
        self.status != Some(0)
    }
}

/// Widget read model for a token (balances as decimal strings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenData {
    pub token_balance: String,
    pub symbol: String,
    /// Approximate price in stable-coin units; display only
    pub price: f64,
    pub decimals: u8,
    pub allowance: String,
}
