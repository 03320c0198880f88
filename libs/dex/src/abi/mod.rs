//! ABI definitions and calldata codecs
//!
//! Each submodule keeps its ABI as a JSON constant (the same JSON a block
//! explorer publishes) and exposes `encode_*` / `decode_*` pairs.
//!
//! # Supported Contracts
//! - Uniswap V2 factory and pair
//! - ERC-20 tokens
//! - The custodial swap contract (`buyTokens_v2Router` / `sellTokens_v2Router`)

pub mod erc20;
pub mod swap_router;
pub mod uniswap_v2;

use ethers_core::abi::{Contract, Token};
use ethers_core::types::{Address, Bytes, U256};

use crate::error::DexError;

/// Parse a JSON ABI
pub(crate) fn load(abi_json: &str) -> Result<Contract, DexError> {
    Ok(Contract::load(abi_json.as_bytes())?)
}

/// Encode selector + arguments for `function` of `abi_json`
pub(crate) fn encode_call(
    abi_json: &str,
    function: &str,
    args: &[Token],
) -> Result<Bytes, DexError> {
    let contract = load(abi_json)?;
    let data = contract.function(function)?.encode_input(args)?;
    Ok(Bytes::from(data))
}

/// Decode the return data of `function`
pub(crate) fn decode_output(
    abi_json: &str,
    function: &str,
    data: &[u8],
) -> Result<Vec<Token>, DexError> {
    let contract = load(abi_json)?;
    Ok(contract.function(function)?.decode_output(data)?)
}

pub(crate) fn single(
    function: &'static str,
    mut tokens: Vec<Token>,
) -> Result<Token, DexError> {
    if tokens.len() != 1 {
        return Err(DexError::unexpected(
            function,
            format!("expected 1 value, got {}", tokens.len()),
        ));
    }
    Ok(tokens.remove(0))
}

pub(crate) fn as_uint(function: &'static str, token: Token) -> Result<U256, DexError> {
    token
        .into_uint()
        .ok_or_else(|| DexError::unexpected(function, "expected uint"))
}

pub(crate) fn as_address(function: &'static str, token: Token) -> Result<Address, DexError> {
    token
        .into_address()
        .ok_or_else(|| DexError::unexpected(function, "expected address"))
}
