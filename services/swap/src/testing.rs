//! In-memory node and wallet for exercising swap flows without a chain
//!
//! [`FakeChain`] answers `eth_call` by `(to, selector)` and records every
//! call; [`FakeWallet`] scripts account access, signature outcomes and
//! receipts.

use async_trait::async_trait;
use dex::selectors;
use ethers::abi::{encode, Token};
use ethers::types::{Address, Bytes, H256, U256};
use parking_lot::Mutex;
use perch_types::TxReceipt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::error::SwapError;
use crate::node::{ChainReader, ContractCall, ReceiptSource};
use crate::wallet::WalletProvider;

/// Receipt that appears after a number of pending polls
#[derive(Debug, Clone)]
struct ScriptedReceipt {
    pending_polls: u32,
    receipt: TxReceipt,
}

#[derive(Default)]
struct ReceiptBook {
    receipts: Mutex<HashMap<H256, ScriptedReceipt>>,
    polls: AtomicU32,
}

impl ReceiptBook {
    fn insert(&self, receipt: TxReceipt, pending_polls: u32) {
        self.receipts.lock().insert(
            receipt.transaction_hash,
            ScriptedReceipt {
                pending_polls,
                receipt,
            },
        );
    }

    fn poll(&self, tx_hash: H256) -> Option<TxReceipt> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let mut receipts = self.receipts.lock();
        let scripted = receipts.get_mut(&tx_hash)?;
        if scripted.pending_polls > 0 {
            scripted.pending_polls -= 1;
            return None;
        }
        Some(scripted.receipt.clone())
    }
}

/// Successful receipt mined in block 1
pub fn mined(tx_hash: H256) -> TxReceipt {
    TxReceipt {
        transaction_hash: tx_hash,
        block_number: Some(1),
        status: Some(1),
    }
}

/// Node double keyed by contract address and 4-byte selector
#[derive(Default)]
pub struct FakeChain {
    outputs: Mutex<HashMap<(Address, [u8; 4]), Bytes>>,
    reverts: Mutex<HashMap<Address, String>>,
    balances: Mutex<HashMap<Address, U256>>,
    calls: Mutex<Vec<ContractCall>>,
    receipts: ReceiptBook,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_output(self, to: Address, selector: [u8; 4], tokens: &[Token]) -> Self {
        self.outputs
            .lock()
            .insert((to, selector), Bytes::from(encode(tokens)));
        self
    }

    /// `getPair` on `factory` answers `pair` for any token
    pub fn with_pair(self, factory: Address, pair: Address) -> Self {
        self.with_output(factory, selectors::GET_PAIR, &[Token::Address(pair)])
    }

    /// Raw `getReserves()` slots of `pair`
    pub fn with_reserves(
        self,
        pair: Address,
        reserve0: impl Into<U256>,
        reserve1: impl Into<U256>,
    ) -> Self {
        self.with_output(
            pair,
            selectors::GET_RESERVES,
            &[
                Token::Uint(reserve0.into()),
                Token::Uint(reserve1.into()),
                Token::Uint(U256::from(1_700_000_000u64)),
            ],
        )
    }

    /// ERC-20 metadata plus one balance and allowance answered for every account
    pub fn with_erc20(
        self,
        token: Address,
        symbol: &str,
        decimals: u8,
        balance: impl Into<U256>,
        allowance: impl Into<U256>,
    ) -> Self {
        self.with_output(token, selectors::SYMBOL, &[Token::String(symbol.to_string())])
            .with_output(token, selectors::DECIMALS, &[Token::Uint(U256::from(decimals))])
            .with_output(token, selectors::BALANCE_OF, &[Token::Uint(balance.into())])
            .with_output(token, selectors::ALLOWANCE, &[Token::Uint(allowance.into())])
    }

    pub fn with_balance(self, account: Address, amount: impl Into<U256>) -> Self {
        self.balances.lock().insert(account, amount.into());
        self
    }

    /// Every call to `to` reverts with `reason`
    pub fn with_revert(self, to: Address, reason: &str) -> Self {
        self.reverts.lock().insert(to, reason.to_string());
        self
    }

    pub fn with_receipt(self, receipt: TxReceipt, pending_polls: u32) -> Self {
        self.receipts.insert(receipt, pending_polls);
        self
    }

    /// Every `eth_call` seen so far, in order
    pub fn calls(&self) -> Vec<ContractCall> {
        self.calls.lock().clone()
    }

    pub fn receipt_polls(&self) -> u32 {
        self.receipts.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn call(&self, call: &ContractCall) -> Result<Bytes, SwapError> {
        self.calls.lock().push(call.clone());

        if let Some(reason) = self.reverts.lock().get(&call.to) {
            return Err(SwapError::SimulationReverted {
                reason: reason.clone(),
            });
        }

        let selector: [u8; 4] = match call.data.get(..4) {
            Some(bytes) => [bytes[0], bytes[1], bytes[2], bytes[3]],
            None => return Ok(Bytes::default()),
        };
        // Unregistered functions behave like calls returning nothing
        Ok(self
            .outputs
            .lock()
            .get(&(call.to, selector))
            .cloned()
            .unwrap_or_default())
    }

    async fn balance(&self, account: Address) -> Result<U256, SwapError> {
        Ok(self
            .balances
            .lock()
            .get(&account)
            .copied()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ReceiptSource for FakeChain {
    async fn receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, SwapError> {
        Ok(self.receipts.poll(tx_hash))
    }
}

/// Wallet double with scripted outcomes
pub struct FakeWallet {
    accounts: Vec<Address>,
    account_error: Option<SwapError>,
    send_error: Option<SwapError>,
    send_delay: Option<Duration>,
    tx_hash: H256,
    sent: Mutex<Vec<ContractCall>>,
    account_requests: AtomicU32,
    receipts: ReceiptBook,
}

impl FakeWallet {
    /// Connected wallet exposing one account
    pub fn new(account: Address) -> Self {
        Self {
            accounts: vec![account],
            account_error: None,
            send_error: None,
            send_delay: None,
            tx_hash: H256::repeat_byte(0x77),
            sent: Mutex::new(Vec::new()),
            account_requests: AtomicU32::new(0),
            receipts: ReceiptBook::default(),
        }
    }

    /// No injected provider at all
    pub fn unavailable() -> Self {
        let mut wallet = Self::new(Address::zero());
        wallet.accounts.clear();
        wallet.account_error = Some(SwapError::WalletUnavailable(
            "no provider injected".to_string(),
        ));
        wallet
    }

    /// The user dismisses the signature prompt
    pub fn rejecting_signature(mut self) -> Self {
        self.send_error = Some(SwapError::UserRejected);
        self
    }

    /// The user takes `delay` to confirm the signature prompt
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: H256) -> Self {
        self.tx_hash = tx_hash;
        self
    }

    pub fn with_receipt(self, receipt: TxReceipt, pending_polls: u32) -> Self {
        self.receipts.insert(receipt, pending_polls);
        self
    }

    pub fn tx_hash(&self) -> H256 {
        self.tx_hash
    }

    /// Transactions handed over for signing
    pub fn sent(&self) -> Vec<ContractCall> {
        self.sent.lock().clone()
    }

    pub fn account_requests(&self) -> u32 {
        self.account_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, SwapError> {
        self.account_requests.fetch_add(1, Ordering::SeqCst);
        match &self.account_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.accounts.clone()),
        }
    }

    async fn accounts(&self) -> Result<Vec<Address>, SwapError> {
        Ok(self.accounts.clone())
    }

    async fn send_transaction(&self, tx: &ContractCall) -> Result<H256, SwapError> {
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.send_error {
            return Err(err.clone());
        }
        self.sent.lock().push(tx.clone());
        Ok(self.tx_hash)
    }
}

#[async_trait]
impl ReceiptSource for FakeWallet {
    async fn receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, SwapError> {
        Ok(self.receipts.poll(tx_hash))
    }
}
