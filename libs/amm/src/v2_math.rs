//! Uniswap V2 AMM math with exact integer calculations
//!
//! Mirrors the on-chain `UniswapV2Library` so a quote shown to the user is
//! the amount the router will compute, to the wei.

use perch_types::{ReservePair, SwapDirection, U256};

use crate::error::AmmError;

/// Input multiplier after the 0.3% LP fee
pub const FEE_NUMERATOR: u64 = 997;
pub const FEE_DENOMINATOR: u64 = 1000;

/// Reserves oriented for one swap direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V2PoolState {
    pub reserve_in: U256,
    pub reserve_out: U256,
}

impl V2PoolState {
    pub fn new(reserve_in: U256, reserve_out: U256) -> Self {
        Self {
            reserve_in,
            reserve_out,
        }
    }

    /// Orient a token/base snapshot: buying spends base, selling spends the token
    pub fn from_reserves(reserves: &ReservePair, direction: SwapDirection) -> Self {
        let (reserve_in, reserve_out) = reserves.oriented(direction);
        Self::new(reserve_in, reserve_out)
    }

    pub fn quote_output(&self, amount_in: U256) -> Result<U256, AmmError> {
        V2Math::quote_output(amount_in, self.reserve_in, self.reserve_out)
    }

    pub fn quote_input(&self, amount_out: U256) -> Result<U256, AmmError> {
        V2Math::quote_input(amount_out, self.reserve_in, self.reserve_out)
    }
}

/// V2 AMM math functions with zero precision loss
pub struct V2Math;

impl V2Math {
    /// Output amount for a given input using the fee-adjusted x*y=k formula
    ///
    /// `floor(amount_in·997·reserve_out / (reserve_in·1000 + amount_in·997))`
    ///
    /// # Arguments
    /// * `amount_in` - Input token amount (smallest units)
    /// * `reserve_in` - Reserve of the token being spent
    /// * `reserve_out` - Reserve of the token being received
    pub fn quote_output(
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<U256, AmmError> {
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }

        let amount_in_with_fee = amount_in
            .checked_mul(U256::from(FEE_NUMERATOR))
            .ok_or(AmmError::Overflow("amount_in * 997"))?;
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out)
            .ok_or(AmmError::Overflow("quote_output numerator"))?;
        let denominator = reserve_in
            .checked_mul(U256::from(FEE_DENOMINATOR))
            .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
            .ok_or(AmmError::Overflow("quote_output denominator"))?;

        Ok(numerator / denominator)
    }

    /// Required input amount for a desired output (reverse calculation)
    ///
    /// `floor(reserve_in·amount_out·1000 / ((reserve_out−amount_out)·997)) + 1`
    pub fn quote_input(
        amount_out: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<U256, AmmError> {
        if reserve_in.is_zero() || reserve_out.is_zero() {
            return Err(AmmError::InsufficientLiquidity);
        }
        if amount_out >= reserve_out {
            return Err(AmmError::ExcessiveOutput {
                amount_out: amount_out.to_string(),
                reserve_out: reserve_out.to_string(),
            });
        }

        let numerator = reserve_in
            .checked_mul(amount_out)
            .and_then(|n| n.checked_mul(U256::from(FEE_DENOMINATOR)))
            .ok_or(AmmError::Overflow("quote_input numerator"))?;
        let denominator = (reserve_out - amount_out)
            .checked_mul(U256::from(FEE_NUMERATOR))
            .ok_or(AmmError::Overflow("quote_input denominator"))?;

        // Add 1 to round up (ensures sufficient input)
        (numerator / denominator)
            .checked_add(U256::one())
            .ok_or(AmmError::Overflow("quote_input rounding"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> U256 {
        U256::from(v)
    }

    #[test]
    fn test_v2_output_calculation() {
        // 99_700_000 / 1_099_700 = 90.66 -> floor
        let output = V2Math::quote_output(u(100), u(1000), u(1000)).unwrap();
        assert_eq!(output, u(90));
    }

    #[test]
    fn test_v2_output_matches_router_for_realistic_pool() {
        // 1 WETH into a 100 WETH / 200_000 TOKEN pool
        let weth = U256::exp10(18);
        let output =
            V2Math::quote_output(weth, weth * u(100), U256::exp10(18) * u(200_000)).unwrap();

        let expected = (weth * u(997) * U256::exp10(18) * u(200_000))
            / (weth * u(100) * u(1000) + weth * u(997));
        assert_eq!(output, expected);
        assert!(output < U256::exp10(18) * u(2_000));
    }

    #[test]
    fn test_zero_input_quotes_zero() {
        assert_eq!(V2Math::quote_output(u(0), u(10), u(10)).unwrap(), u(0));
    }

    #[test]
    fn test_zero_reserves_rejected() {
        for (r_in, r_out) in [(0, 1000), (1000, 0), (0, 0)] {
            assert_eq!(
                V2Math::quote_output(u(100), u(r_in), u(r_out)),
                Err(AmmError::InsufficientLiquidity)
            );
            assert_eq!(
                V2Math::quote_input(u(1), u(r_in), u(r_out)),
                Err(AmmError::InsufficientLiquidity)
            );
        }
    }

    #[test]
    fn test_input_calculation_rounds_up() {
        // 1000 * 90 * 1000 / (910 * 997) = 99.19 -> 99 + 1
        let input = V2Math::quote_input(u(90), u(1000), u(1000)).unwrap();
        assert_eq!(input, u(100));
        assert!(V2Math::quote_output(input, u(1000), u(1000)).unwrap() >= u(90));
    }

    #[test]
    fn test_input_rejects_draining_output() {
        assert!(matches!(
            V2Math::quote_input(u(1000), u(1000), u(1000)),
            Err(AmmError::ExcessiveOutput { .. })
        ));
        assert!(matches!(
            V2Math::quote_input(u(5000), u(1000), u(1000)),
            Err(AmmError::ExcessiveOutput { .. })
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert!(matches!(
            V2Math::quote_output(U256::MAX, u(1), u(1)),
            Err(AmmError::Overflow(_))
        ));
    }

    #[test]
    fn test_pool_state_orientation() {
        let reserves = ReservePair::new(u(2000), u(1000));

        let buy = V2PoolState::from_reserves(&reserves, SwapDirection::Buy);
        assert_eq!(buy, V2PoolState::new(u(1000), u(2000)));

        let sell = V2PoolState::from_reserves(&reserves, SwapDirection::Sell);
        assert_eq!(sell.quote_output(u(100)).unwrap(), u(47));
    }
}
