//! Reserve Reader
//!
//! Always reads fresh pool state; nothing here is cached because a stale
//! snapshot would produce a quote the router no longer honors.

use dex::uniswap_v2;
use ethers::types::Address;
use perch_types::ReservePair;
use std::sync::Arc;
use tracing::debug;

use crate::error::SwapError;
use crate::logging::LogEmoji;
use crate::node::{ChainReader, ContractCall};

/// Resolves V2 pairs and reads their reserves oriented to a token/base view
pub struct ReserveReader<C: ?Sized> {
    chain: Arc<C>,
    factory: Address,
    base: Address,
}

impl<C: ChainReader + ?Sized> ReserveReader<C> {
    pub fn new(chain: Arc<C>, factory: Address, base: Address) -> Self {
        Self {
            chain,
            factory,
            base,
        }
    }

    /// `factory.getPair(token, base)`; the zero address means no pool
    pub async fn pair_for(&self, token: Address) -> Result<Address, SwapError> {
        debug!("{} Resolving pair for {:?}", LogEmoji::SEARCH, token);
        let call = ContractCall::read(self.factory, uniswap_v2::encode_get_pair(token, self.base)?);
        let output = self.chain.call(&call).await?;
        let pair = uniswap_v2::decode_get_pair(&output)?;

        if pair.is_zero() {
            return Err(SwapError::PairNotFound { token });
        }
        debug!("Pair for {:?} is {:?}", token, pair);
        Ok(pair)
    }

    /// Reserves of `pair` against the configured base currency
    pub async fn fetch_reserves(
        &self,
        pair: Address,
        token: Address,
    ) -> Result<ReservePair, SwapError> {
        self.fetch_reserves_against(pair, token, self.base).await
    }

    /// Reserves of `pair` with `token` on the token side and `base` on the other
    ///
    /// Used directly for the stable/base reference pool where the stable coin
    /// plays the token role.
    pub async fn fetch_reserves_against(
        &self,
        pair: Address,
        token: Address,
        base: Address,
    ) -> Result<ReservePair, SwapError> {
        let call = ContractCall::read(pair, uniswap_v2::encode_get_reserves()?);
        let output = self.chain.call(&call).await?;
        let raw = uniswap_v2::decode_get_reserves(&output)?;

        let reserves = ReservePair::from_slots(raw.reserve0, raw.reserve1, token, base);
        debug!(
            "{} Reserves of {:?}: token={} base={}",
            LogEmoji::POOL,
            pair,
            reserves.token_reserves,
            reserves.base_reserves
        );
        Ok(reserves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChain;
    use ethers::types::U256;

    const FACTORY: Address = Address::repeat_byte(0xfa);

    #[tokio::test]
    async fn test_token_in_slot_zero_when_below_base() {
        let base = Address::repeat_byte(0x80);
        let token = Address::repeat_byte(0x10);
        let pair = Address::repeat_byte(0x55);
        let chain = Arc::new(FakeChain::new().with_reserves(pair, 1_000u64, 5u64));

        let reader = ReserveReader::new(chain, FACTORY, base);
        let reserves = reader.fetch_reserves(pair, token).await.unwrap();
        assert_eq!(reserves, ReservePair::new(U256::from(1_000u64), U256::from(5u64)));
    }

    #[tokio::test]
    async fn test_token_in_slot_one_when_above_base() {
        let base = Address::repeat_byte(0x10);
        let token = Address::repeat_byte(0x80);
        let pair = Address::repeat_byte(0x55);
        let chain = Arc::new(FakeChain::new().with_reserves(pair, 1_000u64, 5u64));

        let reader = ReserveReader::new(chain, FACTORY, base);
        let reserves = reader.fetch_reserves(pair, token).await.unwrap();
        assert_eq!(reserves, ReservePair::new(U256::from(5u64), U256::from(1_000u64)));
    }

    #[tokio::test]
    async fn test_missing_pair_is_distinct_error() {
        let token = Address::repeat_byte(0x10);
        let chain = Arc::new(FakeChain::new().with_pair(FACTORY, Address::zero()));

        let reader = ReserveReader::new(chain, FACTORY, Address::repeat_byte(0x80));
        assert_eq!(
            reader.pair_for(token).await,
            Err(SwapError::PairNotFound { token })
        );
    }

    #[tokio::test]
    async fn test_every_read_hits_the_node() {
        let pair = Address::repeat_byte(0x55);
        let chain = Arc::new(FakeChain::new().with_reserves(pair, 7u64, 9u64));
        let reader = ReserveReader::new(chain.clone(), FACTORY, Address::repeat_byte(0x80));

        for _ in 0..3 {
            reader
                .fetch_reserves(pair, Address::repeat_byte(0x10))
                .await
                .unwrap();
        }
        assert_eq!(chain.calls().len(), 3);
    }
}
