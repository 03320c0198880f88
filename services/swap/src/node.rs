//! Blockchain node access
//!
//! [`ChainReader`] covers read-only `eth_call`, simulation and balances;
//! [`ReceiptSource`] covers receipt lookups so that both the node and the
//! wallet can back the receipt poller. [`EthersNode`] implements both on an
//! ethers `Provider`.

use async_trait::async_trait;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider, ProviderError, RpcError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256};
use perch_config::ChainConfig;
use perch_types::TxReceipt;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::SwapError;

/// A contract call, used both for `eth_call` and as the transaction handed to the wallet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractCall {
    pub from: Option<Address>,
    pub to: Address,
    pub value: Option<U256>,
    pub data: Bytes,
}

impl ContractCall {
    /// Read-only call without sender or value
    pub fn read(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            ..Default::default()
        }
    }

    pub fn from_sender(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = Some(value);
        self
    }
}

/// Read side of the node
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// `eth_call` at the latest block; a revert maps to `SimulationReverted`
    async fn call(&self, call: &ContractCall) -> Result<Bytes, SwapError>;

    /// Native-currency balance
    async fn balance(&self, account: Address) -> Result<U256, SwapError>;
}

/// Anything that can look up a mined receipt
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// `Ok(None)` while the transaction is pending
    async fn receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, SwapError>;
}

/// Node access through an ethers provider
pub struct EthersNode<P = Http> {
    provider: Provider<P>,
}

impl EthersNode<Http> {
    /// HTTP provider with a pooled client
    pub fn connect(config: &ChainConfig) -> Result<Self, SwapError> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(5)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SwapError::NetworkError(format!("HTTP client: {}", e)))?;

        let url: Url = config
            .rpc_url
            .parse()
            .map_err(|e| SwapError::InvalidConfiguration(format!("chain.rpc_url: {}", e)))?;

        debug!("Connecting to node at {}", url);
        Ok(Self::new(Provider::new(Http::new_with_client(
            url,
            http_client,
        ))))
    }
}

impl<P: JsonRpcClient> EthersNode<P> {
    pub fn new(provider: Provider<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Provider<P> {
        &self.provider
    }
}

#[async_trait]
impl<P> ChainReader for EthersNode<P>
where
    P: JsonRpcClient + 'static,
{
    async fn call(&self, call: &ContractCall) -> Result<Bytes, SwapError> {
        let mut request = TransactionRequest::new().to(call.to).data(call.data.clone());
        if let Some(from) = call.from {
            request = request.from(from);
        }
        if let Some(value) = call.value {
            request = request.value(value);
        }
        let tx: TypedTransaction = request.into();

        self.provider
            .call(&tx, None)
            .await
            .map_err(call_error)
    }

    async fn balance(&self, account: Address) -> Result<U256, SwapError> {
        self.provider
            .get_balance(account, None)
            .await
            .map_err(|e| SwapError::NetworkError(e.to_string()))
    }
}

#[async_trait]
impl<P> ReceiptSource for EthersNode<P>
where
    P: JsonRpcClient + 'static,
{
    async fn receipt(&self, tx_hash: H256) -> Result<Option<TxReceipt>, SwapError> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map(|receipt| receipt.map(to_tx_receipt))
            .map_err(|e| SwapError::NetworkError(e.to_string()))
    }
}

fn to_tx_receipt(receipt: TransactionReceipt) -> TxReceipt {
    TxReceipt {
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.as_u64()),
        status: receipt.status.map(|s| s.as_u64()),
    }
}

/// Separate contract reverts from transport failures
fn call_error(err: ProviderError) -> SwapError {
    if let Some(response) = err.as_error_response() {
        if let Some(data) = response.as_revert_data() {
            let reason = dex::decode_revert_reason(&data);
            warn!("eth_call reverted: {}", reason);
            return SwapError::SimulationReverted { reason };
        }
        if response.message.contains("revert") {
            warn!("eth_call reverted: {}", response.message);
            return SwapError::SimulationReverted {
                reason: response.message.clone(),
            };
        }
    }
    SwapError::NetworkError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::MockProvider;

    fn mocked() -> (EthersNode<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        (EthersNode::new(provider), mock)
    }

    #[tokio::test]
    async fn test_balance_reads_node() {
        let (node, mock) = mocked();
        mock.push(U256::from(42u64)).unwrap();

        let balance = node.balance(Address::repeat_byte(0x01)).await.unwrap();
        assert_eq!(balance, U256::from(42u64));
    }

    #[tokio::test]
    async fn test_call_returns_raw_output() {
        let (node, mock) = mocked();
        mock.push::<Bytes, _>(Bytes::from(vec![0u8; 32])).unwrap();

        let call = ContractCall::read(Address::repeat_byte(0x02), Bytes::from(vec![0x09, 0x02]));
        let output = node.call(&call).await.unwrap();
        assert_eq!(output.len(), 32);
    }

    #[tokio::test]
    async fn test_pending_receipt_is_none() {
        let (node, mock) = mocked();
        mock.push(serde_json::Value::Null).unwrap();

        assert_eq!(node.receipt(H256::repeat_byte(0xab)).await.unwrap(), None);
    }

    #[test]
    fn test_call_builder() {
        let call = ContractCall::read(Address::repeat_byte(0x02), Bytes::default())
            .from_sender(Address::repeat_byte(0x03))
            .with_value(U256::from(5));
        assert_eq!(call.from, Some(Address::repeat_byte(0x03)));
        assert_eq!(call.value, Some(U256::from(5)));
    }
}
