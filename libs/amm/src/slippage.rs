//! Slippage guard: integer-safe minimum output bound
//!
//! A tolerance like `0.25` is scaled by `10^(fractional digits)` so that
//! `(100 - s)` becomes an integer and the bound is computed with a single
//! floor division on `U256`. No floating point touches the value that
//! protects user funds.

use perch_types::U256;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::AmmError;

const ONE_HUNDRED: u64 = 100;

/// `10^(number of fractional digits)` of the tolerance
///
/// Trailing zeros do not count: `0.50` and `0.5` both yield 10.
pub fn basis_points_multiplier(slippage_percent: Decimal) -> U256 {
    U256::exp10(slippage_percent.normalize().scale() as usize)
}

/// Normalized tolerance, or `InvalidSlippage` outside `[0, 100)`
pub fn validate_slippage(slippage_percent: Decimal) -> Result<Decimal, AmmError> {
    let slippage = slippage_percent.normalize();
    if slippage.is_sign_negative() || slippage >= Decimal::from(ONE_HUNDRED) {
        return Err(AmmError::InvalidSlippage(slippage_percent.to_string()));
    }
    Ok(slippage)
}

/// Lowest acceptable output for `amount_out` under the given tolerance
///
/// `floor(amount_out · ((100 − s)·bp) / (100·bp))`
///
/// Tolerances below 0 or at/above 100 are rejected; a 100% tolerance would
/// accept any output including zero.
pub fn min_acceptable(amount_out: U256, slippage_percent: Decimal) -> Result<U256, AmmError> {
    let slippage = validate_slippage(slippage_percent)?;

    let bp = basis_points_multiplier(slippage);
    // slippage = mantissa / 10^scale, so slippage * bp == mantissa exactly
    let scaled_slippage = U256::from(slippage.mantissa().unsigned_abs());
    let denominator = U256::from(ONE_HUNDRED)
        .checked_mul(bp)
        .ok_or(AmmError::Overflow("slippage denominator"))?;
    let numerator_factor = denominator - scaled_slippage;

    let bound = amount_out
        .checked_mul(numerator_factor)
        .ok_or(AmmError::Overflow("slippage numerator"))?
        / denominator;

    debug!(
        %amount_out,
        %slippage,
        %bp,
        %bound,
        "Computed minimum acceptable output"
    );

    Ok(bound)
}
