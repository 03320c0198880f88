//! ERC-20 token ABI: reads used by the widget plus `approve`

use ethers_core::abi::Token;
use ethers_core::types::{Address, Bytes, U256};

use super::{as_uint, decode_output, encode_call, single};
use crate::error::DexError;

/// ERC-20 ABI subset
pub const ERC20_ABI: &str = r#"[
    {"constant":true,"inputs":[{"name":"account","type":"address"}],"name":"balanceOf","outputs":[{"name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
    {"constant":true,"inputs":[],"name":"symbol","outputs":[{"name":"","type":"string"}],"stateMutability":"view","type":"function"},
    {"constant":true,"inputs":[],"name":"decimals","outputs":[{"name":"","type":"uint8"}],"stateMutability":"view","type":"function"},
    {"constant":true,"inputs":[{"name":"owner","type":"address"},{"name":"spender","type":"address"}],"name":"allowance","outputs":[{"name":"","type":"uint256"}],"stateMutability":"view","type":"function"},
    {"constant":false,"inputs":[{"name":"spender","type":"address"},{"name":"amount","type":"uint256"}],"name":"approve","outputs":[{"name":"","type":"bool"}],"stateMutability":"nonpayable","type":"function"}
]"#;

pub fn encode_balance_of(account: Address) -> Result<Bytes, DexError> {
    encode_call(ERC20_ABI, "balanceOf", &[Token::Address(account)])
}

pub fn decode_balance_of(data: &[u8]) -> Result<U256, DexError> {
    let tokens = decode_output(ERC20_ABI, "balanceOf", data)?;
    as_uint("balanceOf", single("balanceOf", tokens)?)
}

pub fn encode_symbol() -> Result<Bytes, DexError> {
    encode_call(ERC20_ABI, "symbol", &[])
}

pub fn decode_symbol(data: &[u8]) -> Result<String, DexError> {
    let tokens = decode_output(ERC20_ABI, "symbol", data)?;
    single("symbol", tokens)?
        .into_string()
        .ok_or_else(|| DexError::unexpected("symbol", "expected string"))
}

pub fn encode_decimals() -> Result<Bytes, DexError> {
    encode_call(ERC20_ABI, "decimals", &[])
}

pub fn decode_decimals(data: &[u8]) -> Result<u8, DexError> {
    let tokens = decode_output(ERC20_ABI, "decimals", data)?;
    let value = as_uint("decimals", single("decimals", tokens)?)?;
    u8::try_from(value).map_err(|_| DexError::unexpected("decimals", "value exceeds uint8"))
}

pub fn encode_allowance(owner: Address, spender: Address) -> Result<Bytes, DexError> {
    encode_call(
        ERC20_ABI,
        "allowance",
        &[Token::Address(owner), Token::Address(spender)],
    )
}

pub fn decode_allowance(data: &[u8]) -> Result<U256, DexError> {
    let tokens = decode_output(ERC20_ABI, "allowance", data)?;
    as_uint("allowance", single("allowance", tokens)?)
}

pub fn encode_approve(spender: Address, amount: U256) -> Result<Bytes, DexError> {
    encode_call(
        ERC20_ABI,
        "approve",
        &[Token::Address(spender), Token::Uint(amount)],
    )
}
