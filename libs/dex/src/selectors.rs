//! Function and error selector constants
//!
//! First four bytes of `keccak256(signature)`. Tests check each constant
//! against the selector ethabi derives from the ABI JSON.

/// `getPair(address,address)`
pub const GET_PAIR: [u8; 4] = [0xe6, 0xa4, 0x39, 0x05];

/// `getReserves()`
pub const GET_RESERVES: [u8; 4] = [0x09, 0x02, 0xf1, 0xac];

/// `balanceOf(address)`
pub const BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// `symbol()`
pub const SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];

/// `decimals()`
pub const DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// `allowance(address,address)`
pub const ALLOWANCE: [u8; 4] = [0xdd, 0x62, 0xed, 0x3e];

/// `approve(address,uint256)`
pub const APPROVE: [u8; 4] = [0x09, 0x5e, 0xa7, 0xb3];

/// `Error(string)` revert payload
pub const ERROR_STRING: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// `Panic(uint256)` revert payload
pub const PANIC_UINT: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::utils::id;

    #[test]
    fn test_selectors_match_signatures() {
        assert_eq!(GET_PAIR, id("getPair(address,address)"));
        assert_eq!(GET_RESERVES, id("getReserves()"));
        assert_eq!(BALANCE_OF, id("balanceOf(address)"));
        assert_eq!(SYMBOL, id("symbol()"));
        assert_eq!(DECIMALS, id("decimals()"));
        assert_eq!(ALLOWANCE, id("allowance(address,address)"));
        assert_eq!(APPROVE, id("approve(address,uint256)"));
        assert_eq!(ERROR_STRING, id("Error(string)"));
        assert_eq!(PANIC_UINT, id("Panic(uint256)"));
    }
}
