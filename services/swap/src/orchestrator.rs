//! # Swap Orchestrator
//!
//! Drives one buy or sell from the user's click to a mined receipt:
//!
//! ```text
//! Idle → AddressResolving → ReservesFetching → QuoteComputed → TxSimulating
//!      → TxAwaitingSignature → TxBroadcast → TxConfirmed | Failed
//! ```
//!
//! Every transition is published on a `watch` channel. Request validation
//! and quote math run before the wallet is asked to sign anything, the call
//! is dry-run with `eth_call` from the signer, and a broadcast transaction is
//! never resubmitted. One orchestrator runs at most one wallet flow at a
//! time; a second concurrent call fails with `SwapInProgress`.

use dex::{erc20, swap_router};
use ethers::types::{Address, Bytes, H256, U256};
use perch_amm::{min_acceptable, validate_slippage, V2PoolState};
use perch_types::{Quote, ReservePair, SwapDirection, SwapRequest, TxReceipt};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::contracts::Contracts;
use crate::error::SwapError;
use crate::logging::LogEmoji;
use crate::node::{ChainReader, ContractCall, ReceiptSource};
use crate::receipt::{wait_for_receipt, PollPolicy};
use crate::reserves::ReserveReader;
use crate::wallet::WalletProvider;
use crate::{log_error, log_execution, log_quote, log_search, log_success, log_wallet};

/// Observable progress of a swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapState {
    Idle,
    AddressResolving,
    ReservesFetching,
    QuoteComputed(Quote),
    TxSimulating,
    TxAwaitingSignature,
    TxBroadcast(H256),
    TxConfirmed(TxReceipt),
    Failed(SwapError),
}

impl SwapState {
    pub fn name(&self) -> &'static str {
        match self {
            SwapState::Idle => "Idle",
            SwapState::AddressResolving => "AddressResolving",
            SwapState::ReservesFetching => "ReservesFetching",
            SwapState::QuoteComputed(_) => "QuoteComputed",
            SwapState::TxSimulating => "TxSimulating",
            SwapState::TxAwaitingSignature => "TxAwaitingSignature",
            SwapState::TxBroadcast(_) => "TxBroadcast",
            SwapState::TxConfirmed(_) => "TxConfirmed",
            SwapState::Failed(_) => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SwapState::TxConfirmed(_) | SwapState::Failed(_))
    }
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pure quote: engine output plus slippage bound, no I/O
pub fn compute_quote(
    reserves: &ReservePair,
    direction: SwapDirection,
    amount_in: U256,
    request: &SwapRequest,
) -> Result<Quote, SwapError> {
    let pool = V2PoolState::from_reserves(reserves, direction);
    let amount_out = pool.quote_output(amount_in)?;
    if amount_out.is_zero() {
        return Err(SwapError::InvalidQuote(format!(
            "{} of {} yields zero output",
            direction, amount_in
        )));
    }
    let amount_out_min = min_acceptable(amount_out, request.slippage_percent)?;

    Ok(Quote {
        direction,
        amount_in,
        amount_out,
        amount_out_min,
    })
}

/// Swap-contract call for a quote, sent from `signer`
pub fn swap_call(
    swap_contract: Address,
    signer: Address,
    token: Address,
    quote: &Quote,
) -> Result<ContractCall, SwapError> {
    let call = match quote.direction {
        SwapDirection::Buy => {
            ContractCall::read(swap_contract, swap_router::encode_buy(token, quote.amount_out_min)?)
                .with_value(quote.amount_in)
        }
        SwapDirection::Sell => ContractCall::read(
            swap_contract,
            swap_router::encode_sell(token, quote.amount_in, quote.amount_out_min)?,
        ),
    };
    Ok(call.from_sender(signer))
}

/// Coordinates reader, quote engine, wallet and receipt polling
pub struct SwapOrchestrator<C, W> {
    chain: Arc<C>,
    wallet: Arc<W>,
    reserves: ReserveReader<C>,
    swap_contract: Address,
    polling: PollPolicy,
    state_tx: watch::Sender<SwapState>,
    in_flight: Mutex<()>,
    cancel_tx: watch::Sender<bool>,
}

impl<C, W> SwapOrchestrator<C, W>
where
    C: ChainReader + ReceiptSource,
    W: WalletProvider,
{
    /// Fails with `MissingConfiguration` when no swap contract is configured
    pub fn new(
        chain: Arc<C>,
        wallet: Arc<W>,
        contracts: &Contracts,
        polling: PollPolicy,
    ) -> Result<Self, SwapError> {
        let swap_contract = contracts.require_swap_contract()?;
        let reserves = ReserveReader::new(chain.clone(), contracts.factory, contracts.base);
        let (state_tx, _) = watch::channel(SwapState::Idle);
        let (cancel_tx, _) = watch::channel(false);

        Ok(Self {
            chain,
            wallet,
            reserves,
            swap_contract,
            polling,
            state_tx,
            in_flight: Mutex::new(()),
            cancel_tx,
        })
    }

    /// Receiver for state transitions
    pub fn subscribe(&self) -> watch::Receiver<SwapState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> SwapState {
        self.state_tx.borrow().clone()
    }

    /// Cancel the flow in progress
    ///
    /// The flag stays raised until the next flow starts. A flow that has not
    /// reached the wallet yet stops with `Cancelled { tx_hash: None }`; one
    /// already broadcast stops polling with the hash, and the transaction
    /// itself may still be mined.
    pub fn cancel(&self) {
        info!("{} Cancel requested in state {}", LogEmoji::WARNING, self.state());
        self.cancel_tx.send_replace(true);
    }

    fn ensure_not_cancelled(&self) -> Result<(), SwapError> {
        if *self.cancel_tx.borrow() {
            return Err(SwapError::Cancelled { tx_hash: None });
        }
        Ok(())
    }

    fn transition(&self, state: SwapState) {
        info!("{} Swap state → {}", LogEmoji::SWAP, state);
        self.state_tx.send_replace(state);
    }

    fn begin(&self) -> Result<MutexGuard<'_, ()>, SwapError> {
        let guard = self.in_flight.try_lock().map_err(|_| {
            warn!("Rejecting concurrent wallet flow");
            SwapError::SwapInProgress
        })?;
        self.cancel_tx.send_replace(false);
        Ok(guard)
    }

    async fn resolve_signer(&self) -> Result<Address, SwapError> {
        log_search!("Requesting wallet account");
        let accounts = self.wallet.request_accounts().await?;
        accounts
            .first()
            .copied()
            .ok_or_else(|| SwapError::WalletUnavailable("wallet exposed no accounts".to_string()))
    }

    /// Read-only quote preview: no wallet, no state transitions
    pub async fn quote(
        &self,
        request: &SwapRequest,
        direction: SwapDirection,
    ) -> Result<Quote, SwapError> {
        let amount_in = request.amount_in()?;
        validate_slippage(request.slippage_percent)?;

        let pair = self.reserves.pair_for(request.token_address).await?;
        let reserves = self
            .reserves
            .fetch_reserves(pair, request.token_address)
            .await?;
        compute_quote(&reserves, direction, amount_in, request)
    }

    /// Spend base currency for the token
    pub async fn buy(&self, request: &SwapRequest) -> Result<TxReceipt, SwapError> {
        self.execute(request, SwapDirection::Buy).await
    }

    /// Spend the token for base currency
    pub async fn sell(&self, request: &SwapRequest) -> Result<TxReceipt, SwapError> {
        self.execute(request, SwapDirection::Sell).await
    }

    pub async fn execute(
        &self,
        request: &SwapRequest,
        direction: SwapDirection,
    ) -> Result<TxReceipt, SwapError> {
        let _guard = self.begin()?;

        match self.run(request, direction).await {
            Ok(receipt) => {
                log_success!(
                    "{} of {:?} confirmed: {:?}",
                    direction,
                    request.token_address,
                    receipt.transaction_hash
                );
                self.transition(SwapState::TxConfirmed(receipt.clone()));
                Ok(receipt)
            }
            Err(err) => {
                if err.is_pre_signature() {
                    log_error!("{} aborted before broadcast: {}", direction, err);
                } else {
                    log_error!("{} broadcast but not confirmed: {}", direction, err);
                }
                self.transition(SwapState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        request: &SwapRequest,
        direction: SwapDirection,
    ) -> Result<TxReceipt, SwapError> {
        // Bad input never reaches the wallet
        let amount_in = request.amount_in()?;
        validate_slippage(request.slippage_percent)?;
        let token = request.token_address;

        self.transition(SwapState::AddressResolving);
        let signer = self.resolve_signer().await?;

        self.transition(SwapState::ReservesFetching);
        let pair = self.reserves.pair_for(token).await?;
        let reserves = self.reserves.fetch_reserves(pair, token).await?;

        let quote = compute_quote(&reserves, direction, amount_in, request)?;
        log_quote!(
            "{} {:?}: in={} out={} min_out={} (slippage {}%)",
            direction,
            token,
            quote.amount_in,
            quote.amount_out,
            quote.amount_out_min,
            request.slippage_percent
        );
        self.transition(SwapState::QuoteComputed(quote));

        self.ensure_not_cancelled()?;
        self.transition(SwapState::TxSimulating);
        let call = swap_call(self.swap_contract, signer, token, &quote)?;
        debug!("{} Simulating {} from {:?}", LogEmoji::SIMULATE, direction, signer);
        self.chain.call(&call).await?;

        self.ensure_not_cancelled()?;
        self.transition(SwapState::TxAwaitingSignature);
        log_wallet!("Awaiting signature for {} of {:?}", direction, token);
        let tx_hash = self.wallet.send_transaction(&call).await?;

        log_execution!("{} broadcast: {:?}", direction, tx_hash);
        self.transition(SwapState::TxBroadcast(tx_hash));

        wait_for_receipt(
            self.chain.as_ref(),
            tx_hash,
            &self.polling,
            Some(self.cancel_tx.subscribe()),
        )
        .await
    }

    /// Grant the swap contract an unlimited allowance on `token`
    ///
    /// Returns the hash once broadcast; confirmation is left to
    /// [`wait_for_receipt`](Self::wait_for_receipt).
    pub async fn approve(&self, token: Address) -> Result<H256, SwapError> {
        let _guard = self.begin()?;
        let signer = self.resolve_signer().await?;

        let call = ContractCall::read(token, erc20::encode_approve(self.swap_contract, U256::MAX)?)
            .from_sender(signer);
        debug!("{} Simulating approve of {:?}", LogEmoji::SIMULATE, token);
        self.chain.call(&call).await?;

        self.ensure_not_cancelled()?;
        log_wallet!("Awaiting signature for approve of {:?}", token);
        let tx_hash = self.wallet.send_transaction(&call).await?;
        log_execution!("Approve broadcast: {:?}", tx_hash);
        Ok(tx_hash)
    }

    /// Native-currency transfer to `to`, confirmed through the wallet's own receipts
    pub async fn deposit(&self, to: Address, amount: U256) -> Result<TxReceipt, SwapError> {
        if amount.is_zero() {
            return Err(SwapError::InvalidAmount("deposit amount is zero".to_string()));
        }
        let _guard = self.begin()?;
        let signer = self.resolve_signer().await?;

        let transfer = ContractCall::read(to, Bytes::default())
            .from_sender(signer)
            .with_value(amount);
        self.ensure_not_cancelled()?;
        log_wallet!("Awaiting signature for deposit of {} wei to {:?}", amount, to);
        let tx_hash = self.wallet.send_transaction(&transfer).await?;
        log_execution!("Deposit broadcast: {:?}", tx_hash);

        wait_for_receipt(
            self.wallet.as_ref(),
            tx_hash,
            &self.polling,
            Some(self.cancel_tx.subscribe()),
        )
        .await
    }

    /// Wait for any transaction through the node
    ///
    /// Holds the in-flight guard, so it is cancellable like the other flows.
    pub async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TxReceipt, SwapError> {
        let _guard = self.begin()?;
        wait_for_receipt(
            self.chain.as_ref(),
            tx_hash,
            &self.polling,
            Some(self.cancel_tx.subscribe()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request(amount: &str) -> SwapRequest {
        SwapRequest {
            token_address: Address::repeat_byte(0x20),
            amount: amount.to_string(),
            slippage_percent: dec!(0.5),
            token_decimals: 18,
        }
    }

    #[test]
    fn test_buy_quote_uses_base_as_input() {
        // token reserves 2000, base reserves 1000
        let reserves = ReservePair::new(U256::from(2000u64), U256::from(1000u64));
        let quote =
            compute_quote(&reserves, SwapDirection::Buy, U256::from(100u64), &request("100"))
                .unwrap();
        // 100·997·2000 / (1000·1000 + 99700) = 181.3
        assert_eq!(quote.amount_out, U256::from(181u64));
        assert_eq!(quote.amount_out_min, U256::from(180u64));
    }

    #[test]
    fn test_sell_quote_uses_token_as_input() {
        let reserves = ReservePair::new(U256::from(1000u64), U256::from(1000u64));
        let quote =
            compute_quote(&reserves, SwapDirection::Sell, U256::from(100u64), &request("100"))
                .unwrap();
        assert_eq!(quote.amount_out, U256::from(90u64));
        assert_eq!(quote.amount_out_min, U256::from(89u64));
    }

    #[test]
    fn test_dust_quote_rejected() {
        let reserves = ReservePair::new(U256::from(10u64), U256::from(1_000_000u64));
        assert!(matches!(
            compute_quote(&reserves, SwapDirection::Buy, U256::from(1u64), &request("1")),
            Err(SwapError::InvalidQuote(_))
        ));
    }

    #[test]
    fn test_buy_call_carries_value() {
        let quote = Quote {
            direction: SwapDirection::Buy,
            amount_in: U256::from(100u64),
            amount_out: U256::from(90u64),
            amount_out_min: U256::from(89u64),
        };
        let swap = Address::repeat_byte(0x5a);
        let signer = Address::repeat_byte(0x01);
        let token = Address::repeat_byte(0x20);

        let call = swap_call(swap, signer, token, &quote).unwrap();
        assert_eq!(call.to, swap);
        assert_eq!(call.from, Some(signer));
        assert_eq!(call.value, Some(U256::from(100u64)));
        assert_eq!(call.data, swap_router::encode_buy(token, U256::from(89u64)).unwrap());

        let sell = Quote {
            direction: SwapDirection::Sell,
            ..quote
        };
        let call = swap_call(swap, signer, token, &sell).unwrap();
        assert_eq!(call.value, None);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SwapState::Idle.to_string(), "Idle");
        assert!(SwapState::Failed(SwapError::UserRejected).is_terminal());
        assert!(!SwapState::TxBroadcast(H256::zero()).is_terminal());
    }
}
