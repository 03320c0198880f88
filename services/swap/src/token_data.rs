//! Token read model for the widget
//!
//! Balances, metadata, allowance towards the swap contract and the display
//! price, each read fresh from the node.

use dex::erc20;
use ethers::types::{Address, U256};
use perch_amm::token_price_with_scales;
use perch_types::{ReservePair, TokenData};
use std::sync::Arc;
use tracing::debug;

use crate::contracts::Contracts;
use crate::error::SwapError;
use crate::node::{ChainReader, ContractCall};
use crate::reserves::ReserveReader;

pub struct TokenDataReader<C: ?Sized> {
    chain: Arc<C>,
    reserves: ReserveReader<C>,
    contracts: Contracts,
}

impl<C: ChainReader + ?Sized> TokenDataReader<C> {
    pub fn new(chain: Arc<C>, contracts: Contracts) -> Self {
        let reserves = ReserveReader::new(chain.clone(), contracts.factory, contracts.base);
        Self {
            chain,
            reserves,
            contracts,
        }
    }

    pub fn reserve_reader(&self) -> &ReserveReader<C> {
        &self.reserves
    }

    /// Native-currency balance in wei
    pub async fn balance(&self, wallet: Address) -> Result<U256, SwapError> {
        self.chain.balance(wallet).await
    }

    pub async fn token_balance(&self, wallet: Address, token: Address) -> Result<U256, SwapError> {
        let output = self
            .chain
            .call(&ContractCall::read(token, erc20::encode_balance_of(wallet)?))
            .await?;
        Ok(erc20::decode_balance_of(&output)?)
    }

    pub async fn symbol(&self, token: Address) -> Result<String, SwapError> {
        let output = self
            .chain
            .call(&ContractCall::read(token, erc20::encode_symbol()?))
            .await?;
        Ok(erc20::decode_symbol(&output)?)
    }

    pub async fn decimals(&self, token: Address) -> Result<u8, SwapError> {
        let output = self
            .chain
            .call(&ContractCall::read(token, erc20::encode_decimals()?))
            .await?;
        Ok(erc20::decode_decimals(&output)?)
    }

    /// Allowance granted by `wallet` to the swap contract
    pub async fn allowance(&self, wallet: Address, token: Address) -> Result<U256, SwapError> {
        let spender = self.contracts.require_swap_contract()?;
        let call = ContractCall::read(token, erc20::encode_allowance(wallet, spender)?)
            .from_sender(wallet);
        let output = self.chain.call(&call).await?;
        Ok(erc20::decode_allowance(&output)?)
    }

    /// Reserves of `token` against the base currency, resolving its pair
    pub async fn reserves(&self, token: Address) -> Result<(Address, ReservePair), SwapError> {
        let pair = self.reserves.pair_for(token).await?;
        let reserves = self.reserves.fetch_reserves(pair, token).await?;
        Ok((pair, reserves))
    }

    /// Display price in stable-coin units through the stable/base pool
    pub async fn price(&self, token: Address, token_decimals: u8) -> Result<f64, SwapError> {
        let (_, token_pair) = self.reserves(token).await?;
        self.price_from(&token_pair, token_decimals).await
    }

    async fn price_from(
        &self,
        token_pair: &ReservePair,
        token_decimals: u8,
    ) -> Result<f64, SwapError> {
        let stable_pair = self
            .reserves
            .fetch_reserves_against(
                self.contracts.stable_pair,
                self.contracts.stable,
                self.contracts.base,
            )
            .await?;
        Ok(token_price_with_scales(
            token_pair,
            &stable_pair,
            token_decimals,
            self.contracts.scales,
        )?)
    }

    /// Everything the widget shows for `token`
    pub async fn token_data(&self, wallet: Address, token: Address) -> Result<TokenData, SwapError> {
        let (_, token_pair) = self.reserves(token).await?;
        let decimals = self.decimals(token).await?;
        let symbol = self.symbol(token).await?;
        let price = self.price_from(&token_pair, decimals).await?;
        let token_balance = self.token_balance(wallet, token).await?;
        let allowance = self.allowance(wallet, token).await?;

        debug!("Token data for {:?}: {} at {}", token, symbol, price);
        Ok(TokenData {
            token_balance: token_balance.to_string(),
            symbol,
            price,
            decimals,
            allowance: allowance.to_string(),
        })
    }
}
