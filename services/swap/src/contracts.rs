//! Parsed contract addresses

use ethers::types::Address;
use perch_amm::PriceScales;
use perch_config::ContractsConfig;

use crate::error::SwapError;

/// Addresses from [`ContractsConfig`], parsed once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contracts {
    pub factory: Address,
    /// Base currency (WETH)
    pub base: Address,
    /// Stable coin used for display prices (USDC)
    pub stable: Address,
    /// Stable/base reference pool
    pub stable_pair: Address,
    pub swap_contract: Option<Address>,
    pub scales: PriceScales,
}

macro_rules! invalid {
    ($result:expr) => {
        $result.map_err(|e| SwapError::InvalidConfiguration(format!("{:#}", e)))?
    };
}

impl Contracts {
    pub fn from_config(config: &ContractsConfig) -> Result<Self, SwapError> {
        Ok(Self {
            factory: invalid!(config.factory_address()),
            base: invalid!(config.weth_address()),
            stable: invalid!(config.usdc_address()),
            stable_pair: invalid!(config.usdc_pair_address()),
            swap_contract: invalid!(config.swap_contract_address()),
            scales: PriceScales {
                base_decimals: config.base_decimals,
                stable_decimals: config.stable_decimals,
            },
        })
    }

    /// The custodial swap contract, required by every signing flow
    pub fn require_swap_contract(&self) -> Result<Address, SwapError> {
        self.swap_contract
            .ok_or(SwapError::MissingConfiguration("contracts.swap_contract"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse_without_swap_contract() {
        let contracts = Contracts::from_config(&ContractsConfig::default()).unwrap();
        assert_eq!(contracts.scales, PriceScales::default());
        assert_eq!(
            contracts.require_swap_contract(),
            Err(SwapError::MissingConfiguration("contracts.swap_contract"))
        );
    }

    #[test]
    fn test_bad_address_is_invalid_configuration() {
        let config = ContractsConfig {
            usdc: "0x1234".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            Contracts::from_config(&config),
            Err(SwapError::InvalidConfiguration(_))
        ));
    }
}
