//! Revert payload decoding
//!
//! Turns the `data` of a reverted `eth_call` into a message a user can read.

use ethers_core::abi::{decode, ParamType, Token};
use tracing::debug;

use crate::selectors::{ERROR_STRING, PANIC_UINT};

/// Best-effort human readable reason for a revert payload
///
/// - `Error(string)` → the string
/// - `Panic(uint256)` → `panic code 0x..`
/// - empty → `execution reverted`
/// - anything else (custom errors) → the raw hex
pub fn decode_revert_reason(data: &[u8]) -> String {
    if data.is_empty() {
        return "execution reverted".to_string();
    }
    if data.len() >= 4 {
        let (selector, payload) = data.split_at(4);
        if selector == ERROR_STRING {
            if let Ok(mut tokens) = decode(&[ParamType::String], payload) {
                if let Some(Token::String(reason)) = tokens.pop() {
                    return reason;
                }
            }
        } else if selector == PANIC_UINT {
            if let Ok(mut tokens) = decode(&[ParamType::Uint(256)], payload) {
                if let Some(Token::Uint(code)) = tokens.pop() {
                    return format!("panic code {:#x}", code);
                }
            }
        }
    }
    debug!("Undecodable revert payload ({} bytes)", data.len());
    format!("0x{}", hex::encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::abi::encode;
    use ethers_core::types::U256;

    #[test]
    fn test_error_string() {
        let mut data = ERROR_STRING.to_vec();
        data.extend(encode(&[Token::String(
            "UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT".into(),
        )]));
        assert_eq!(
            decode_revert_reason(&data),
            "UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT"
        );
    }

    #[test]
    fn test_panic_code() {
        let mut data = PANIC_UINT.to_vec();
        data.extend(encode(&[Token::Uint(U256::from(0x11u64))]));
        assert_eq!(decode_revert_reason(&data), "panic code 0x11");
    }

    #[test]
    fn test_unknown_and_empty_payloads() {
        assert_eq!(decode_revert_reason(&[]), "execution reverted");
        assert_eq!(decode_revert_reason(&[0xde, 0xad, 0xbe, 0xef]), "0xdeadbeef");
    }
}
