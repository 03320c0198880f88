//! Uniswap V2 and compatible protocol ABIs
//!
//! Factory `getPair` to locate the token/WETH pool and pair `getReserves` to
//! read its balances.

use ethers_core::abi::Token;
use ethers_core::types::{Address, Bytes, U256};

use super::{as_address, as_uint, decode_output, encode_call, single};
use crate::error::DexError;

/// Uniswap V2 factory ABI (getPair only)
pub const FACTORY_ABI: &str = r#"[
    {"constant":true,"inputs":[{"name":"tokenA","type":"address"},{"name":"tokenB","type":"address"}],"name":"getPair","outputs":[{"name":"pair","type":"address"}],"stateMutability":"view","type":"function"}
]"#;

/// Uniswap V2 pair ABI (getReserves only)
pub const PAIR_ABI: &str = r#"[
    {"constant":true,"inputs":[],"name":"getReserves","outputs":[{"name":"_reserve0","type":"uint112"},{"name":"_reserve1","type":"uint112"},{"name":"_blockTimestampLast","type":"uint32"}],"stateMutability":"view","type":"function"}
]"#;

/// Raw `getReserves()` result in pair slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawReserves {
    pub reserve0: U256,
    pub reserve1: U256,
    pub block_timestamp_last: u32,
}

/// `getPair(tokenA, tokenB)`; argument order does not matter to the factory
pub fn encode_get_pair(token_a: Address, token_b: Address) -> Result<Bytes, DexError> {
    encode_call(
        FACTORY_ABI,
        "getPair",
        &[Token::Address(token_a), Token::Address(token_b)],
    )
}

/// Pair address, or `Address::zero()` when the factory has no pool
pub fn decode_get_pair(data: &[u8]) -> Result<Address, DexError> {
    let tokens = decode_output(FACTORY_ABI, "getPair", data)?;
    as_address("getPair", single("getPair", tokens)?)
}

pub fn encode_get_reserves() -> Result<Bytes, DexError> {
    encode_call(PAIR_ABI, "getReserves", &[])
}

pub fn decode_get_reserves(data: &[u8]) -> Result<RawReserves, DexError> {
    let mut tokens = decode_output(PAIR_ABI, "getReserves", data)?.into_iter();
    let (Some(r0), Some(r1), Some(ts)) = (tokens.next(), tokens.next(), tokens.next()) else {
        return Err(DexError::unexpected("getReserves", "expected 3 values"));
    };
    let block_timestamp_last = as_uint("getReserves", ts)?;
    Ok(RawReserves {
        reserve0: as_uint("getReserves", r0)?,
        reserve1: as_uint("getReserves", r1)?,
        block_timestamp_last: u32::try_from(block_timestamp_last)
            .map_err(|_| DexError::unexpected("getReserves", "timestamp exceeds uint32"))?,
    })
}
