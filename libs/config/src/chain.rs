//! Ethereum mainnet constants used as configuration defaults

/// Uniswap V2 factory
pub const V2_FACTORY: &str = "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f";

/// Wrapped ether, the base currency of every traded pool
pub const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

/// USDC, the stable quote currency for display prices
pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

/// Uniswap V2 USDC/WETH pair
pub const USDC_WETH_PAIR: &str = "0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc";

pub const WETH_DECIMALS: u8 = 18;
pub const USDC_DECIMALS: u8 = 6;

pub const MAINNET_CHAIN_ID: u64 = 1;

/// Identity provider page the login flow redirects through
pub const AUTHORIZE_URL: &str = "https://api.twitter.com/oauth/authenticate";
