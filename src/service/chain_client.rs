//! 区块链客户端抽象
//!
//! 编排层只依赖 [`ChainClient`]：部署合约、发送状态变更交易、只读调用。
//! 签名、gas 估算、交易广播全部交给 ethers-rs。

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt,
        TransactionRequest, TxHash, U256, U64,
    },
};
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};

/// 合约创建交易的回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployReceipt {
    pub tx_hash: TxHash,
    pub contract_address: Address,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

/// 普通合约调用交易的回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

/// 部署过程回调
///
/// `on_hash` 在交易广播后立即触发（尚未确认），`on_receipt` 在拿到回执后触发。
pub trait DeployHooks: Send + Sync {
    fn on_hash(&self, _hash: TxHash) {}

    fn on_receipt(&self, _receipt: &DeployReceipt) {}
}

/// 不关心回调时使用
pub struct NoopHooks;

impl DeployHooks for NoopHooks {}

/// 只关心交易哈希时可直接传闭包
impl<F> DeployHooks for F
where
    F: Fn(TxHash) + Send + Sync,
{
    fn on_hash(&self, hash: TxHash) {
        self(hash)
    }
}

/// 链客户端统一接口
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// 签名账户，只读客户端返回 None
    fn account(&self) -> Option<Address>;

    fn chain_id(&self) -> u64;

    /// 发送合约创建交易并等待回执
    async fn deploy(&self, init_code: Bytes, hooks: &dyn DeployHooks)
        -> DeployResult<DeployReceipt>;

    /// 发送状态变更交易并等待回执
    async fn send_transaction(&self, to: Address, data: Bytes) -> DeployResult<CallReceipt>;

    /// 只读调用 (eth_call)
    async fn call(&self, to: Address, data: Bytes) -> DeployResult<Bytes>;
}

/// 基于 ethers-rs 中间件的实现
#[derive(Debug)]
pub struct EthersChainClient<M> {
    client: Arc<M>,
    account: Option<Address>,
    chain_id: u64,
}

/// 本地私钥签名的 HTTP 客户端
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

impl<M: Middleware + 'static> EthersChainClient<M> {
    pub fn new(client: Arc<M>, account: Option<Address>, chain_id: u64) -> Self {
        Self {
            client,
            account,
            chain_id,
        }
    }

    fn signer_account(&self) -> DeployResult<Address> {
        self.account.ok_or_else(|| {
            DeployError::invalid_parameter("read-only client cannot sign transactions")
        })
    }

    /// 广播交易，哈希可用时回调，然后等待回执
    async fn submit(
        &self,
        tx: TypedTransaction,
        on_hash: impl FnOnce(TxHash) + Send,
    ) -> DeployResult<TransactionReceipt> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(DeployError::rpc)?;

        let tx_hash = pending.tx_hash();
        tracing::info!(tx_hash = ?tx_hash, chain_id = self.chain_id, "Transaction broadcast");
        on_hash(tx_hash);

        let receipt = pending
            .await
            .map_err(DeployError::rpc)?
            .ok_or(DeployError::TransactionDropped(tx_hash))?;

        if receipt.status == Some(U64::zero()) {
            tracing::error!(tx_hash = ?tx_hash, "Transaction reverted");
            return Err(DeployError::TransactionReverted(tx_hash));
        }

        Ok(receipt)
    }
}

impl EthersChainClient<SignerClient> {
    /// 连接 RPC 并用私钥签名，链 ID 必须与预期一致
    pub async fn connect(
        rpc_url: &str,
        private_key: &str,
        expected_chain_id: u64,
    ) -> anyhow::Result<Self> {
        let provider =
            Provider::<Http>::try_from(rpc_url).context("Failed to create Ethereum provider")?;

        let chain_id = provider
            .get_chainid()
            .await
            .context("Failed to query chain id")?
            .as_u64();
        if chain_id != expected_chain_id {
            anyhow::bail!(
                "RPC endpoint reports chain {} but chain {} was requested",
                chain_id,
                expected_chain_id
            );
        }

        let wallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .context("Invalid deployer private key")?
            .with_chain_id(chain_id);
        let account = wallet.address();

        tracing::info!(account = ?account, chain_id, rpc = %rpc_url, "Signer client connected");

        let client = SignerMiddleware::new(provider, wallet);
        Ok(Self::new(Arc::new(client), Some(account), chain_id))
    }
}

impl EthersChainClient<Provider<Http>> {
    /// 只读客户端（用于读取其他链上的 RouterConfig）
    pub fn read_only(rpc_url: &str, chain_id: u64) -> anyhow::Result<Self> {
        let provider =
            Provider::<Http>::try_from(rpc_url).context("Failed to create Ethereum provider")?;
        Ok(Self::new(Arc::new(provider), None, chain_id))
    }
}

#[async_trait]
impl<M: Middleware + 'static> ChainClient for EthersChainClient<M> {
    fn account(&self) -> Option<Address> {
        self.account
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn deploy(
        &self,
        init_code: Bytes,
        hooks: &dyn DeployHooks,
    ) -> DeployResult<DeployReceipt> {
        let from = self.signer_account()?;

        let mut tx: TypedTransaction = TransactionRequest::new().from(from).data(init_code).into();
        let gas = self
            .client
            .estimate_gas(&tx, None)
            .await
            .map_err(|e| DeployError::GasEstimation(e.to_string()))?;
        tx.set_gas(gas);

        tracing::debug!(from = ?from, gas = %gas, "Submitting contract creation");

        let receipt = self.submit(tx, |hash| hooks.on_hash(hash)).await?;
        let contract_address = receipt
            .contract_address
            .ok_or(DeployError::ContractAddressMissing(receipt.transaction_hash))?;

        let deploy_receipt = DeployReceipt {
            tx_hash: receipt.transaction_hash,
            contract_address,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
        };
        hooks.on_receipt(&deploy_receipt);

        Ok(deploy_receipt)
    }

    async fn send_transaction(&self, to: Address, data: Bytes) -> DeployResult<CallReceipt> {
        let from = self.signer_account()?;
        let tx: TypedTransaction = TransactionRequest::new().from(from).to(to).data(data).into();

        let receipt = self.submit(tx, |_| {}).await?;
        Ok(CallReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.map(|b| b.as_u64()),
            gas_used: receipt.gas_used,
        })
    }

    async fn call(&self, to: Address, data: Bytes) -> DeployResult<Bytes> {
        let mut request = TransactionRequest::new().to(to).data(data);
        if let Some(from) = self.account {
            request = request.from(from);
        }

        self.client
            .call(&request.into(), None)
            .await
            .map_err(DeployError::rpc)
    }
}
