use alloy_network::{EthereumWallet, ReceiptResponse, TransactionBuilder};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::Transport;
use async_trait::async_trait;
use eyre::WrapErr;
use tracing::{debug, trace};

use std::{
    marker::PhantomData,
    time::{Duration, Instant},
};

use crate::{
    calls::{get_nonce, get_owners, get_threshold, get_transaction_hash, get_version, is_owner},
    consts::{DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT},
    transaction_data::{
        ExecutableSafeTransaction, ExecutionReceipt, SafeMetaTransaction, SafeTransactionData,
    },
};

/// The wallet SDK the authorization flow runs against.
///
/// Everything that touches chain state goes through here, so the flow itself
/// can be driven against a mock.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait SafeWallet: Send + Sync {
    /// Address of the Safe.
    fn address(&self) -> Address;

    fn chain_id(&self) -> u64;

    /// Builds the Safe transaction for `tx` at the wallet's current nonce.
    async fn create_transaction(&self, tx: &SafeMetaTransaction) -> eyre::Result<SafeTransactionData>;

    async fn get_transaction_hash(&self, tx: &SafeTransactionData) -> eyre::Result<B256>;

    async fn get_owners(&self) -> eyre::Result<Vec<Address>>;

    async fn get_threshold(&self) -> eyre::Result<usize>;

    async fn get_nonce(&self) -> eyre::Result<U256>;

    async fn estimate_gas(&self, tx: &ExecutableSafeTransaction) -> eyre::Result<u64>;

    /// Signs and broadcasts `tx` with the executor key. Without a gas limit
    /// the node picks one.
    async fn submit(
        &self,
        tx: &ExecutableSafeTransaction,
        gas_limit: Option<u64>,
        executor: &PrivateKeySigner,
    ) -> eyre::Result<B256>;

    /// Waits for the first confirmation of `tx_hash`.
    async fn wait_for_receipt(&self, tx_hash: B256) -> eyre::Result<ExecutionReceipt>;
}

/// A deployed Safe reached through a JSON-RPC provider.
pub struct OnchainSafe<P, T> {
    provider: P,
    safe: Address,
    chain_id: u64,
    receipt_timeout: Duration,
    poll_interval: Duration,
    _transport: PhantomData<fn() -> T>,
}

impl<P, T> OnchainSafe<P, T>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    /// Connects to the Safe at `safe`, reading the chain id from the node.
    pub async fn new(provider: P, safe: Address) -> eyre::Result<Self> {
        let chain_id = provider.get_chain_id().await.wrap_err("failed to read chain id")?;

        Ok(Self {
            provider,
            safe,
            chain_id,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            _transport: PhantomData,
        })
    }

    pub fn with_receipt_timeout(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.receipt_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn version(&self) -> eyre::Result<String> {
        get_version(self.safe, &self.provider).await
    }

    pub async fn is_owner(&self, address: Address) -> eyre::Result<bool> {
        is_owner(address, self.safe, &self.provider).await
    }

    fn request(tx: &ExecutableSafeTransaction) -> TransactionRequest {
        TransactionRequest::default().with_to(tx.safe_address).with_input(tx.input_data.clone())
    }
}

#[async_trait]
impl<P, T> SafeWallet for OnchainSafe<P, T>
where
    T: Transport + Clone,
    P: Provider<T>,
{
    fn address(&self) -> Address {
        self.safe
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn create_transaction(&self, tx: &SafeMetaTransaction) -> eyre::Result<SafeTransactionData> {
        let nonce = get_nonce(self.safe, &self.provider).await?;
        trace!(safe = %self.safe, %nonce, "building safe transaction");

        Ok(SafeTransactionData::call(tx, nonce))
    }

    async fn get_transaction_hash(&self, tx: &SafeTransactionData) -> eyre::Result<B256> {
        get_transaction_hash(tx, self.safe, &self.provider).await
    }

    async fn get_owners(&self) -> eyre::Result<Vec<Address>> {
        get_owners(self.safe, &self.provider).await
    }

    async fn get_threshold(&self) -> eyre::Result<usize> {
        let threshold = get_threshold(self.safe, &self.provider).await?;
        Ok(usize::try_from(threshold)?)
    }

    async fn get_nonce(&self) -> eyre::Result<U256> {
        get_nonce(self.safe, &self.provider).await
    }

    async fn estimate_gas(&self, tx: &ExecutableSafeTransaction) -> eyre::Result<u64> {
        let gas = self.provider.estimate_gas(&Self::request(tx)).await?;
        Ok(gas)
    }

    async fn submit(
        &self,
        tx: &ExecutableSafeTransaction,
        gas_limit: Option<u64>,
        executor: &PrivateKeySigner,
    ) -> eyre::Result<B256> {
        let mut req = Self::request(tx).with_from(executor.address());
        if let Some(gas_limit) = gas_limit {
            req.set_gas_limit(gas_limit);
        }

        let wallet = EthereumWallet::from(executor.clone());
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_provider(&self.provider);

        let pending = provider.send_transaction(req).await?;
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, executor = %executor.address(), "execTransaction broadcast");

        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> eyre::Result<ExecutionReceipt> {
        let deadline = Instant::now() + self.receipt_timeout;

        loop {
            if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                return Ok(ExecutionReceipt {
                    tx_hash,
                    block_number: receipt.block_number(),
                    success: receipt.status(),
                });
            }

            if Instant::now() >= deadline {
                eyre::bail!("no receipt for {tx_hash} after {:?}", self.receipt_timeout);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
