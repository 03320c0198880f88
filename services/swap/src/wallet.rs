//! Wallet capability and the EIP-1193 adapter
//!
//! The swap flow only needs three things from a wallet: the user's account,
//! a signature-and-broadcast of a prepared call, and a receipt lookup. How
//! requests reach the wallet is a transport detail behind
//! [`Eip1193Transport`].

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::error::SwapError;
use crate::logging::LogEmoji;
use crate::node::{ContractCall, ReceiptSource};
use perch_types::TxReceipt;

/// EIP-1193 provider error codes
pub mod codes {
    /// The user rejected the request
    pub const USER_REJECTED: i64 = 4001;
    /// The requested account or method is not authorized
    pub const UNAUTHORIZED: i64 = 4100;
    /// The provider does not support the method
    pub const UNSUPPORTED_METHOD: i64 = 4200;
    /// The provider is disconnected from all chains
    pub const DISCONNECTED: i64 = 4900;
    /// The provider is not connected to the requested chain
    pub const CHAIN_DISCONNECTED: i64 = 4901;
    /// JSON-RPC method not found
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Execution reverted (geth/anvil)
    pub const EXECUTION_REVERTED: i64 = 3;
}

/// Signing wallet as seen by the orchestrator
#[async_trait]
pub trait WalletProvider: ReceiptSource {
    /// Prompt for account access if needed
    async fn request_accounts(&self) -> Result<Vec<Address>, SwapError>;

    /// Accounts already exposed, without prompting
    async fn accounts(&self) -> Result<Vec<Address>, SwapError>;

    /// Sign and broadcast; returns the transaction hash
    async fn send_transaction(&self, tx: &ContractCall) -> Result<H256, SwapError>;
}

/// `ProviderRpcError` as defined by EIP-1193
#[derive(Debug, Clone, PartialEq, Error, Deserialize)]
#[error("provider error {code}: {message}")]
pub struct ProviderRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ProviderRpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<ProviderRpcError> for SwapError {
    fn from(err: ProviderRpcError) -> Self {
        match err.code {
            codes::USER_REJECTED => SwapError::UserRejected,
            codes::UNAUTHORIZED | codes::DISCONNECTED | codes::CHAIN_DISCONNECTED => {
                SwapError::WalletUnavailable(err.message)
            }
            codes::EXECUTION_REVERTED => {
                let reason = err
                    .data
                    .as_ref()
                    .and_then(Value::as_str)
                    .and_then(|hex| hex.parse::<Bytes>().ok())
                    .map(|data| dex::decode_revert_reason(&data))
                    .unwrap_or(err.message);
                SwapError::SimulationReverted { reason }
            }
            _ => SwapError::NetworkError(err.to_string()),
        }
    }
}

/// `request({ method, params })` of an EIP-1193 provider
#[async_trait]
pub trait Eip1193Transport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError>;
}

#[derive(Serialize)]
struct TransactionParams<'a> {
    from: Address,
    to: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<U256>,
    #[serde(skip_serializing_if = "no_calldata")]
    data: &'a Bytes,
}

fn no_calldata(data: &&Bytes) -> bool {
    data.is_empty()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: H256,
    block_number: Option<U64>,
    status: Option<U64>,
}

impl From<RpcReceipt> for TxReceipt {
    fn from(receipt: RpcReceipt) -> Self {
        TxReceipt {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            status: receipt.status.map(|s| s.as_u64()),
        }
    }
}

/// [`WalletProvider`] over any EIP-1193 transport
pub struct Eip1193Wallet<T> {
    transport: T,
}

impl<T: Eip1193Transport> Eip1193Wallet<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn request<R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, SwapError> {
        let value = self.transport.request(method, params).await?;
        serde_json::from_value(value)
            .map_err(|e| SwapError::NetworkError(format!("{} returned malformed result: {}", method, e)))
    }
}

#[async_trait]
impl<T: Eip1193Transport> WalletProvider for Eip1193Wallet<T> {
    async fn request_accounts(&self) -> Result<Vec<Address>, SwapError> {
        debug!("{} eth_requestAccounts", LogEmoji::WALLET);
        let accounts: Vec<Address> = match self.transport.request("eth_requestAccounts", json!([])).await {
            Ok(value) => serde_json::from_value(value)
                .map_err(|e| SwapError::NetworkError(format!("eth_requestAccounts: {}", e)))?,
            // Plain node signers only know eth_accounts
            Err(err)
                if err.code == codes::METHOD_NOT_FOUND
                    || err.code == codes::UNSUPPORTED_METHOD =>
            {
                warn!("eth_requestAccounts unsupported, falling back to eth_accounts");
                self.accounts().await?
            }
            Err(err) => return Err(err.into()),
        };

        if accounts.is_empty() {
            return Err(SwapError::WalletUnavailable(
                "wallet exposed no accounts".to_string(),
            ));
        }
        Ok(accounts)
    }

    async fn accounts(&self) -> Result<Vec<Address>, SwapError> {
        self.request("eth_accounts", json!([])).await
    }

    async fn send_transaction(&self, tx: &ContractCall) -> Result<H256, SwapError> {
        let from = tx
            .from
            .ok_or_else(|| SwapError::WalletUnavailable("transaction has no sender".to_string()))?;
        let params = TransactionParams {
            from,
            to: tx.to,
            value: tx.value,
            data: &tx.data,
        };
        let params = serde_json::to_value([params])
            .map_err(|e| SwapError::NetworkError(format!("encode transaction: {}", e)))?;

        debug!("{} eth_sendTransaction to {:?}", LogEmoji::WALLET, tx.to);
        self.request("eth_sendTransaction", params).await
    }
}

#[async_trait]
impl<T: Eip1193Transport> ReceiptSource for Eip1193Wallet<T> {
    async fn receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, SwapError> {
        let receipt: Option<RpcReceipt> = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        Ok(receipt.map(TxReceipt::from))
    }
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderRpcError>,
}

/// EIP-1193 over plain JSON-RPC, for local signers such as a dev node
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, SwapError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SwapError::NetworkError(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }
}

#[async_trait]
impl Eip1193Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });

        let response = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderRpcError::new(codes::DISCONNECTED, e.to_string()))?;
        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderRpcError::new(codes::DISCONNECTED, e.to_string()))?;

        match response.error {
            Some(err) => Err(err),
            None => Ok(response.result.unwrap_or(Value::Null)),
        }
    }
}
