//! Custodial swap contract ABI
//!
//! The contract routes through the V2 router on the user's behalf:
//! buys are payable and take the native amount as `msg.value`, sells pull the
//! approved token amount from the caller.

use ethers_core::abi::Token;
use ethers_core::types::{Address, Bytes, U256};

use super::encode_call;
use crate::error::DexError;

pub const SWAP_ROUTER_ABI: &str = r#"[
    {"inputs":[{"name":"token","type":"address"},{"name":"amountOutMin","type":"uint256"}],"name":"buyTokens_v2Router","outputs":[],"stateMutability":"payable","type":"function"},
    {"inputs":[{"name":"token","type":"address"},{"name":"amountIn","type":"uint256"},{"name":"amountOutMin","type":"uint256"}],"name":"sellTokens_v2Router","outputs":[],"stateMutability":"nonpayable","type":"function"}
]"#;

/// `buyTokens_v2Router(token, amountOutMin)`; send with `value = amountIn`
pub fn encode_buy(token: Address, amount_out_min: U256) -> Result<Bytes, DexError> {
    encode_call(
        SWAP_ROUTER_ABI,
        "buyTokens_v2Router",
        &[Token::Address(token), Token::Uint(amount_out_min)],
    )
}

/// `sellTokens_v2Router(token, amountIn, amountOutMin)`
pub fn encode_sell(
    token: Address,
    amount_in: U256,
    amount_out_min: U256,
) -> Result<Bytes, DexError> {
    encode_call(
        SWAP_ROUTER_ABI,
        "sellTokens_v2Router",
        &[
            Token::Address(token),
            Token::Uint(amount_in),
            Token::Uint(amount_out_min),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::utils::id;

    #[test]
    fn test_buy_calldata_layout() {
        let token = Address::repeat_byte(0x33);
        let data = encode_buy(token, U256::from(89u64)).unwrap();

        assert_eq!(&data[..4], &id("buyTokens_v2Router(address,uint256)"));
        assert_eq!(&data[16..36], token.as_bytes());
        assert_eq!(U256::from_big_endian(&data[36..68]), U256::from(89u64));
    }

    #[test]
    fn test_sell_calldata_layout() {
        let data = encode_sell(Address::repeat_byte(1), U256::from(100u64), U256::from(89u64))
            .unwrap();

        assert_eq!(&data[..4], &id("sellTokens_v2Router(address,uint256,uint256)"));
        assert_eq!(data.len(), 4 + 32 * 3);
        assert_eq!(U256::from_big_endian(&data[36..68]), U256::from(100u64));
        assert_eq!(U256::from_big_endian(&data[68..100]), U256::from(89u64));
    }
}
