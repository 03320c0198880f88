//! End-to-end swap flows against in-memory node and wallet doubles

use dex::{erc20, swap_router};
use ethers::types::{Address, H256, U256};
use perch_amm::PriceScales;
use perch_swap::testing::{mined, FakeChain, FakeWallet};
use perch_swap::{
    Contracts, PollPolicy, SwapError, SwapOrchestrator, SwapState,
};
use perch_types::{SwapDirection, SwapRequest};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

const FACTORY: Address = Address::repeat_byte(0xfa);
const WETH: Address = Address::repeat_byte(0xc0);
const TOKEN: Address = Address::repeat_byte(0x20);
const PAIR: Address = Address::repeat_byte(0x55);
const SWAP: Address = Address::repeat_byte(0x5a);
const USER: Address = Address::repeat_byte(0x01);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("perch_swap=debug")
        .with_test_writer()
        .try_init();
}

fn contracts() -> Contracts {
    Contracts {
        factory: FACTORY,
        base: WETH,
        stable: Address::repeat_byte(0xa0),
        stable_pair: Address::repeat_byte(0xb4),
        swap_contract: Some(SWAP),
        scales: PriceScales::default(),
    }
}

fn fast_polling() -> PollPolicy {
    PollPolicy {
        initial_interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(2),
        backoff_multiplier: 2.0,
        max_attempts: 5,
        timeout: Duration::from_secs(5),
    }
}

/// TOKEN < WETH, so slot 0 holds the token: 1000 token / 1000 base
fn liquid_chain() -> FakeChain {
    FakeChain::new()
        .with_pair(FACTORY, PAIR)
        .with_reserves(PAIR, 1_000u64, 1_000u64)
}

fn request(amount: &str) -> SwapRequest {
    SwapRequest {
        token_address: TOKEN,
        amount: amount.to_string(),
        slippage_percent: dec!(0.5),
        token_decimals: 18,
    }
}

fn orchestrator(
    chain: FakeChain,
    wallet: FakeWallet,
) -> (
    SwapOrchestrator<FakeChain, FakeWallet>,
    Arc<FakeChain>,
    Arc<FakeWallet>,
) {
    init_tracing();
    let chain = Arc::new(chain);
    let wallet = Arc::new(wallet);
    let orchestrator =
        SwapOrchestrator::new(chain.clone(), wallet.clone(), &contracts(), fast_polling())
            .unwrap();
    (orchestrator, chain, wallet)
}

#[tokio::test]
async fn buy_simulates_signs_and_confirms() {
    let wallet = FakeWallet::new(USER);
    let tx_hash = wallet.tx_hash();
    let (orchestrator, chain, wallet) =
        orchestrator(liquid_chain().with_receipt(mined(tx_hash), 1), wallet);

    let receipt = orchestrator.buy(&request("100")).await.unwrap();
    assert_eq!(receipt.transaction_hash, tx_hash);
    assert_eq!(orchestrator.state(), SwapState::TxConfirmed(receipt));

    // getPair, getReserves, then the dry run from the signer
    let calls = chain.calls();
    assert_eq!(calls.len(), 3);
    let simulated = &calls[2];
    assert_eq!(simulated.to, SWAP);
    assert_eq!(simulated.from, Some(USER));
    assert_eq!(simulated.value, Some(U256::from(100u64)));
    // 1000/1000 pool: 100 in → 90 out → 89 at 0.5%
    assert_eq!(
        simulated.data,
        swap_router::encode_buy(TOKEN, U256::from(89u64)).unwrap()
    );

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(&sent[0], simulated);
    assert_eq!(chain.receipt_polls(), 2);
}

#[tokio::test]
async fn sell_sends_amount_in_calldata_without_value() {
    let wallet = FakeWallet::new(USER);
    let tx_hash = wallet.tx_hash();
    let (orchestrator, _chain, wallet) =
        orchestrator(liquid_chain().with_receipt(mined(tx_hash), 0), wallet);

    orchestrator.sell(&request("100")).await.unwrap();

    let sent = wallet.sent();
    assert_eq!(sent[0].value, None);
    assert_eq!(
        sent[0].data,
        swap_router::encode_sell(TOKEN, U256::from(100u64), U256::from(89u64)).unwrap()
    );
}

#[tokio::test]
async fn revert_in_simulation_never_reaches_wallet() {
    let (orchestrator, _chain, wallet) = orchestrator(
        liquid_chain().with_revert(SWAP, "UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT"),
        FakeWallet::new(USER),
    );

    let err = orchestrator.buy(&request("100")).await.unwrap_err();
    assert_eq!(
        err,
        SwapError::SimulationReverted {
            reason: "UniswapV2Router: INSUFFICIENT_OUTPUT_AMOUNT".to_string()
        }
    );
    assert!(wallet.sent().is_empty());
    assert_eq!(orchestrator.state(), SwapState::Failed(err));
}

#[tokio::test]
async fn invalid_amount_fails_before_wallet() {
    let (orchestrator, chain, wallet) = orchestrator(liquid_chain(), FakeWallet::new(USER));

    for amount in ["", "1.5", "-3", "0", "abc"] {
        let err = orchestrator.buy(&request(amount)).await.unwrap_err();
        assert!(matches!(err, SwapError::InvalidAmount(_)), "{amount}: {err}");
    }
    assert_eq!(wallet.account_requests(), 0);
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn out_of_range_slippage_fails_before_wallet() {
    let (orchestrator, _chain, wallet) = orchestrator(liquid_chain(), FakeWallet::new(USER));

    let mut req = request("100");
    req.slippage_percent = dec!(100);
    assert!(matches!(
        orchestrator.buy(&req).await,
        Err(SwapError::InvalidQuote(_))
    ));
    assert_eq!(wallet.account_requests(), 0);
}

#[tokio::test]
async fn empty_pool_is_insufficient_liquidity() {
    let chain = FakeChain::new()
        .with_pair(FACTORY, PAIR)
        .with_reserves(PAIR, 0u64, 1_000u64);
    let (orchestrator, _chain, wallet) = orchestrator(chain, FakeWallet::new(USER));

    assert_eq!(
        orchestrator.buy(&request("100")).await,
        Err(SwapError::InsufficientLiquidity)
    );
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn missing_pair_is_pair_not_found() {
    let chain = FakeChain::new().with_pair(FACTORY, Address::zero());
    let (orchestrator, _chain, _wallet) = orchestrator(chain, FakeWallet::new(USER));

    assert_eq!(
        orchestrator.sell(&request("100")).await,
        Err(SwapError::PairNotFound { token: TOKEN })
    );
}

#[tokio::test]
async fn unavailable_wallet_stops_at_address_resolution() {
    let (orchestrator, chain, _wallet) = orchestrator(liquid_chain(), FakeWallet::unavailable());

    assert!(matches!(
        orchestrator.buy(&request("100")).await,
        Err(SwapError::WalletUnavailable(_))
    ));
    assert!(chain.calls().is_empty());
}

#[tokio::test]
async fn rejected_signature_is_not_retried() {
    let (orchestrator, chain, wallet) =
        orchestrator(liquid_chain(), FakeWallet::new(USER).rejecting_signature());

    assert_eq!(
        orchestrator.buy(&request("100")).await,
        Err(SwapError::UserRejected)
    );
    assert!(wallet.sent().is_empty());
    assert_eq!(chain.receipt_polls(), 0);
}

#[tokio::test]
async fn unconfirmed_transaction_times_out() {
    let wallet = FakeWallet::new(USER).with_tx_hash(H256::repeat_byte(0x99));
    let (orchestrator, chain, _wallet) = orchestrator(liquid_chain(), wallet);

    assert_eq!(
        orchestrator.buy(&request("100")).await,
        Err(SwapError::ConfirmationTimeout {
            tx_hash: H256::repeat_byte(0x99),
            attempts: 5
        })
    );
    assert_eq!(chain.receipt_polls(), 5);
}

#[tokio::test]
async fn concurrent_swap_is_rejected_and_wait_is_cancellable() {
    init_tracing();
    let chain = Arc::new(liquid_chain());
    let wallet = Arc::new(FakeWallet::new(USER));
    let slow_polling = PollPolicy {
        initial_interval: Duration::from_secs(60),
        max_interval: Duration::from_secs(60),
        backoff_multiplier: 1.0,
        max_attempts: 100,
        timeout: Duration::from_secs(600),
    };
    let orchestrator =
        SwapOrchestrator::new(chain, wallet.clone(), &contracts(), slow_polling).unwrap();
    let mut states = orchestrator.subscribe();

    let req = request("100");
    let first = orchestrator.buy(&req);
    tokio::pin!(first);

    tokio::select! {
        result = &mut first => panic!("swap finished early: {:?}", result),
        seen = states.wait_for(|s| matches!(s, SwapState::TxBroadcast(_))) => {
            seen.unwrap();
        }
    }

    assert_eq!(
        orchestrator.sell(&req).await,
        Err(SwapError::SwapInProgress)
    );
    assert_eq!(wallet.sent().len(), 1);

    orchestrator.cancel();
    let cancelled = SwapError::Cancelled {
        tx_hash: Some(H256::repeat_byte(0x77)),
    };
    assert_eq!(first.await, Err(cancelled.clone()));
    assert_eq!(orchestrator.state(), SwapState::Failed(cancelled));
}

#[tokio::test]
async fn cancel_during_signature_prompt_stops_before_polling() {
    init_tracing();
    let chain = Arc::new(liquid_chain());
    let wallet = Arc::new(FakeWallet::new(USER).with_send_delay(Duration::from_millis(100)));
    let polling = PollPolicy {
        max_attempts: 10,
        ..fast_polling()
    };
    let orchestrator =
        SwapOrchestrator::new(chain.clone(), wallet.clone(), &contracts(), polling).unwrap();
    let mut states = orchestrator.subscribe();

    let req = request("100");
    let swap = orchestrator.buy(&req);
    tokio::pin!(swap);

    tokio::select! {
        result = &mut swap => panic!("swap finished early: {:?}", result),
        seen = states.wait_for(|s| matches!(s, SwapState::TxAwaitingSignature)) => {
            seen.unwrap();
        }
    }
    orchestrator.cancel();

    // The wallet still signs, so the hash is reported for follow-up
    let cancelled = SwapError::Cancelled {
        tx_hash: Some(wallet.tx_hash()),
    };
    assert_eq!(swap.await, Err(cancelled.clone()));
    assert_eq!(chain.receipt_polls(), 0);
    assert_eq!(wallet.sent().len(), 1);
    assert_eq!(orchestrator.state(), SwapState::Failed(cancelled));
}

#[tokio::test]
async fn stale_cancel_does_not_affect_next_swap() {
    let hash = H256::repeat_byte(0x77);
    let (orchestrator, _chain, _wallet) = orchestrator(
        liquid_chain().with_receipt(mined(hash), 1),
        FakeWallet::new(USER),
    );

    orchestrator.cancel();
    let receipt = orchestrator.buy(&request("100")).await.unwrap();
    assert_eq!(receipt.transaction_hash, hash);
}

#[tokio::test]
async fn quote_preview_skips_wallet() {
    let (orchestrator, _chain, wallet) = orchestrator(liquid_chain(), FakeWallet::new(USER));

    let quote = orchestrator
        .quote(&request("100"), SwapDirection::Sell)
        .await
        .unwrap();
    assert_eq!(quote.amount_out, U256::from(90u64));
    assert_eq!(quote.amount_out_min, U256::from(89u64));
    assert_eq!(wallet.account_requests(), 0);
    assert_eq!(orchestrator.state(), SwapState::Idle);
}

#[tokio::test]
async fn approve_grants_unlimited_allowance_to_swap_contract() {
    let (orchestrator, chain, wallet) = orchestrator(liquid_chain(), FakeWallet::new(USER));

    let tx_hash = orchestrator.approve(TOKEN).await.unwrap();
    assert_eq!(tx_hash, wallet.tx_hash());

    let expected = erc20::encode_approve(SWAP, U256::MAX).unwrap();
    let simulated = chain.calls().pop().unwrap();
    assert_eq!(simulated.to, TOKEN);
    assert_eq!(simulated.data, expected);
    assert_eq!(wallet.sent()[0].data, expected);
}

#[tokio::test]
async fn deposit_confirms_through_wallet_receipts() {
    let wallet = FakeWallet::new(USER);
    let tx_hash = wallet.tx_hash();
    let wallet = wallet.with_receipt(mined(tx_hash), 2);
    let (orchestrator, chain, wallet) = orchestrator(liquid_chain(), wallet);

    let custodial = Address::repeat_byte(0xcc);
    let receipt = orchestrator
        .deposit(custodial, U256::exp10(16))
        .await
        .unwrap();
    assert_eq!(receipt.transaction_hash, tx_hash);

    let sent = &wallet.sent()[0];
    assert_eq!(sent.to, custodial);
    assert_eq!(sent.value, Some(U256::exp10(16)));
    assert!(sent.data.is_empty());
    assert_eq!(chain.receipt_polls(), 0);
}

#[tokio::test]
async fn zero_deposit_rejected() {
    let (orchestrator, _chain, wallet) = orchestrator(liquid_chain(), FakeWallet::new(USER));

    assert!(matches!(
        orchestrator.deposit(Address::repeat_byte(0xcc), U256::zero()).await,
        Err(SwapError::InvalidAmount(_))
    ));
    assert_eq!(wallet.account_requests(), 0);
}

#[test]
fn orchestrator_requires_swap_contract() {
    let mut contracts = contracts();
    contracts.swap_contract = None;

    let result = SwapOrchestrator::new(
        Arc::new(FakeChain::new()),
        Arc::new(FakeWallet::new(USER)),
        &contracts,
        fast_polling(),
    );
    assert!(matches!(
        result,
        Err(SwapError::MissingConfiguration("contracts.swap_contract"))
    ));
}
