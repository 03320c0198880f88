//! Display price oracle
//!
//! Composes the token/base pool with a base/stable pool to estimate the
//! token's price in stable-coin units. The result is an `f64` for display and
//! must never be used to build a transaction amount.

use perch_types::{ReservePair, U256};

use crate::error::AmmError;

/// f64 holds ~15 significant digits; 10^77 is the last power that fits U256
const MAX_DISPLAY_DECIMALS: u8 = 77;

/// Decimal scales of the two reference currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceScales {
    /// Native wrapped currency (WETH = 18)
    pub base_decimals: u8,
    /// Quote stable coin (USDC = 6)
    pub stable_decimals: u8,
}

impl Default for PriceScales {
    fn default() -> Self {
        Self {
            base_decimals: 18,
            stable_decimals: 6,
        }
    }
}

/// Convert an integer amount to human units, e.g. `1_500_000` at 6 decimals → `1.5`
pub fn to_display_units(amount: U256, decimals: u8) -> Result<f64, AmmError> {
    if decimals > MAX_DISPLAY_DECIMALS {
        return Err(AmmError::InvalidDecimals(decimals));
    }
    // Decimal-string parsing is exact up to f64 precision and never overflows U256 range
    let raw: f64 = amount
        .to_string()
        .parse()
        .map_err(|_| AmmError::Overflow("display conversion"))?;
    Ok(raw / 10f64.powi(decimals as i32))
}

/// Token price in stable units with WETH/USDC scales
///
/// `stable_pair.token_reserves` holds the stable coin, `base_reserves` the
/// native currency, matching how the stable pool is read with the stable coin
/// as the "token".
pub fn token_price(
    token_pair: &ReservePair,
    stable_pair: &ReservePair,
    token_decimals: u8,
) -> Result<f64, AmmError> {
    token_price_with_scales(token_pair, stable_pair, token_decimals, PriceScales::default())
}

/// `(stable / base)_stable_pool × (base / token)_token_pool`, each side scaled by its decimals
pub fn token_price_with_scales(
    token_pair: &ReservePair,
    stable_pair: &ReservePair,
    token_decimals: u8,
    scales: PriceScales,
) -> Result<f64, AmmError> {
    if token_pair.is_empty() || stable_pair.is_empty() {
        return Err(AmmError::InsufficientLiquidity);
    }

    let stable_per_base = to_display_units(stable_pair.token_reserves, scales.stable_decimals)?
        / to_display_units(stable_pair.base_reserves, scales.base_decimals)?;
    let base_per_token = to_display_units(token_pair.base_reserves, scales.base_decimals)?
        / to_display_units(token_pair.token_reserves, token_decimals)?;

    Ok(stable_per_base * base_per_token)
}
