//! 跨链代币部署控制器
//!
//! 无界面版本的"部署跨链代币"页面状态：
//! - `vault` 跟随钱包账户，`minter` 跟随 Router 地址
//! - 原始代币地址或网络变化时重新读取 RouterConfig 中的已有配置
//! - `can_deploy` 为派生状态，`pending` 仅在部署交易进行中为 true，
//!   通过 [`CrosschainTokenController::pending_watcher`] 可在部署期间观察
//!
//! 所有失败都只记录日志并保存在 `last_error`，不会向上传播。

use std::sync::Arc;

use ethers::types::Address;
use tokio::sync::watch;

use crate::domain::{DeploymentParams, UnderlyingToken};
use crate::error::{DeployError, DeployResult};
use crate::service::deployment_orchestrator::DeploymentOrchestrator;
use crate::service::router_config::RouterConfigContract;
use crate::service::transaction_log::{TransactionLog, TransactionSummary};
use crate::utils::{AddressValidator, EVM_ADDRESS_REGEXP};

/// 钱包连接状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalletContext {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
}

impl WalletContext {
    pub fn connected(account: Address, chain_id: u64) -> Self {
        Self {
            account: Some(account),
            chain_id: Some(chain_id),
        }
    }
}

pub struct CrosschainTokenController {
    orchestrator: Arc<DeploymentOrchestrator>,
    transaction_log: Arc<dyn TransactionLog>,
    router_config: Option<RouterConfigContract>,
    wallet: WalletContext,
    underlying: UnderlyingToken,
    vault: Option<Address>,
    minter: Option<Address>,
    crosschain_token_address: Option<Address>,
    can_deploy: bool,
    pending: watch::Sender<bool>,
    last_error: Option<String>,
}

impl CrosschainTokenController {
    pub fn new(
        orchestrator: Arc<DeploymentOrchestrator>,
        transaction_log: Arc<dyn TransactionLog>,
        router_config: Option<RouterConfigContract>,
    ) -> Self {
        Self {
            orchestrator,
            transaction_log,
            router_config,
            wallet: WalletContext::default(),
            underlying: UnderlyingToken {
                decimals: crate::domain::token::UNKNOWN_DECIMALS,
                ..Default::default()
            },
            vault: None,
            minter: None,
            crosschain_token_address: None,
            can_deploy: false,
            pending: watch::channel(false).0,
            last_error: None,
        }
    }

    /// 初次挂载：读取已有配置并计算状态
    pub async fn mount(&mut self) {
        self.refresh_existing_config().await;
        self.recompute_can_deploy();
    }

    pub async fn set_wallet(&mut self, wallet: WalletContext) {
        let chain_changed = wallet.chain_id != self.wallet.chain_id;
        self.wallet = wallet;
        self.vault = wallet.account;

        if chain_changed {
            self.refresh_existing_config().await;
        }
        self.recompute_can_deploy();
    }

    pub fn set_router_address(&mut self, router: Option<Address>) {
        self.minter = router;
        self.recompute_can_deploy();
    }

    pub async fn set_underlying(&mut self, underlying: UnderlyingToken) {
        let changed = underlying.address != self.underlying.address
            || underlying.network_id != self.underlying.network_id;
        if changed {
            // 换了代币，之前读到的跨链地址不再适用
            self.crosschain_token_address = None;
        }
        self.underlying = underlying;

        if changed {
            self.refresh_existing_config().await;
        }
        self.recompute_can_deploy();
    }

    /// 读取 RouterConfig 中原始代币的配置
    ///
    /// 只有原始代币的网络 ID 已知且地址格式正确时才发起读取；读取失败时状态保持不变。
    pub async fn refresh_existing_config(&mut self) {
        let Some(router_config) = &self.router_config else {
            return;
        };
        let Some(chain_id) = self.underlying.network_id else {
            return;
        };
        if !EVM_ADDRESS_REGEXP.is_match(&self.underlying.address) {
            return;
        }

        let result = router_config
            .get_token_config(&self.underlying.address, chain_id)
            .await;

        match result {
            Ok(config) => {
                tracing::debug!(
                    underlying = %self.underlying.address,
                    chain_id,
                    contract_address = ?config.contract_address,
                    "Existing token config loaded"
                );
                if config.is_registered() {
                    self.crosschain_token_address = Some(config.contract_address);
                }
                self.recompute_can_deploy();
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    underlying = %self.underlying.address,
                    chain_id,
                    "Failed to read token config"
                );
            }
        }
    }

    /// 部署跨链代币，成功返回合约地址
    pub async fn deploy(&mut self) -> Option<Address> {
        // &mut self 保证同一时刻只有一个部署在进行
        if !self.can_deploy {
            tracing::debug!("Deployment not allowed");
            return None;
        }

        let params = match self.deployment_params() {
            Ok(params) => params,
            Err(e) => {
                self.record_failure(e);
                return None;
            }
        };

        self.pending.send_replace(true);
        self.last_error = None;

        let result = self.orchestrator.deploy_crosschain_erc20(&params).await;

        self.pending.send_replace(false);

        match result {
            Ok(record) => {
                self.transaction_log
                    .add_transaction(
                        record.hash,
                        TransactionSummary::crosschain_deployment(
                            record.chain_id,
                            &record.name,
                            &record.address,
                        ),
                    )
                    .await;

                self.crosschain_token_address = Some(record.address);
                self.recompute_can_deploy();
                Some(record.address)
            }
            Err(e) => {
                self.record_failure(e);
                None
            }
        }
    }

    fn deployment_params(&self) -> DeployResult<DeploymentParams> {
        let chain_id = self
            .wallet
            .chain_id
            .ok_or_else(|| DeployError::invalid_parameter("wallet is not connected"))?;
        let account = self
            .wallet
            .account
            .ok_or_else(|| DeployError::invalid_parameter("wallet is not connected"))?;
        let vault = self
            .vault
            .ok_or_else(|| DeployError::invalid_parameter("vault is not set"))?;
        let minter = self
            .minter
            .ok_or_else(|| DeployError::invalid_parameter("minter is not set"))?;

        Ok(DeploymentParams {
            chain_id,
            account,
            underlying: AddressValidator::parse(&self.underlying.address)?,
            name: self.underlying.crosschain_name(),
            symbol: self.underlying.crosschain_symbol(),
            decimals: self.underlying.decimals_u8()?,
            vault,
            minter,
        })
    }

    fn record_failure(&mut self, e: DeployError) {
        tracing::error!(
            error = %e,
            code = e.code().as_str(),
            underlying = %self.underlying.address,
            "Crosschain token deployment failed"
        );
        self.last_error = Some(e.to_string());
    }

    fn recompute_can_deploy(&mut self) {
        self.can_deploy = self.underlying.is_complete()
            && self.vault.is_some()
            && self.minter.is_some()
            && self.crosschain_token_address.is_none();
    }

    pub fn can_deploy(&self) -> bool {
        self.can_deploy
    }

    pub fn is_pending(&self) -> bool {
        *self.pending.borrow()
    }

    /// 订阅 `pending` 变化，部署进行中也可读取
    pub fn pending_watcher(&self) -> watch::Receiver<bool> {
        self.pending.subscribe()
    }

    pub fn crosschain_token_address(&self) -> Option<Address> {
        self.crosschain_token_address
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn underlying(&self) -> &UnderlyingToken {
        &self.underlying
    }

    pub fn vault(&self) -> Option<Address> {
        self.vault
    }

    pub fn minter(&self) -> Option<Address> {
        self.minter
    }

    pub fn wallet(&self) -> WalletContext {
        self.wallet
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ethers::types::{Bytes, TxHash};

    use super::*;
    use crate::domain::TokenConfig;
    use crate::infrastructure::artifacts::{ArtifactStore, ContractArtifact, ContractKind};
    use crate::service::chain_client::{CallReceipt, ChainClient, DeployHooks, DeployReceipt};
    use crate::service::transaction_log::InMemoryTransactionLog;

    const CHAIN_ID: u64 = 43114;
    const UNDERLYING: &str = "0x1111111111111111111111111111111111111111";

    /// getTokenConfig 返回预设地址，部署计数
    struct StubClient {
        existing: Option<Address>,
        fail_reads: bool,
        fail_deploy: bool,
        reads: Mutex<usize>,
        deploys: Mutex<usize>,
        /// 部署进行中读取到的 pending 值
        pending: Mutex<Option<watch::Receiver<bool>>>,
        pending_seen: Mutex<Vec<bool>>,
    }

    impl StubClient {
        fn new() -> Self {
            Self {
                existing: None,
                fail_reads: false,
                fail_deploy: false,
                reads: Mutex::new(0),
                deploys: Mutex::new(0),
                pending: Mutex::new(None),
                pending_seen: Mutex::new(Vec::new()),
            }
        }

        fn watch_pending(&self, rx: watch::Receiver<bool>) {
            *self.pending.lock().unwrap() = Some(rx);
        }
    }

    #[async_trait]
    impl ChainClient for StubClient {
        fn account(&self) -> Option<Address> {
            Some(Address::repeat_byte(0x01))
        }

        fn chain_id(&self) -> u64 {
            CHAIN_ID
        }

        async fn deploy(
            &self,
            _init_code: Bytes,
            hooks: &dyn DeployHooks,
        ) -> DeployResult<DeployReceipt> {
            *self.deploys.lock().unwrap() += 1;
            if let Some(rx) = self.pending.lock().unwrap().as_ref() {
                self.pending_seen.lock().unwrap().push(*rx.borrow());
            }
            if self.fail_deploy {
                return Err(DeployError::Rpc("insufficient funds".to_string()));
            }
            let receipt = DeployReceipt {
                tx_hash: TxHash::repeat_byte(0xaa),
                contract_address: Address::repeat_byte(0x22),
                block_number: Some(1),
                gas_used: None,
            };
            hooks.on_hash(receipt.tx_hash);
            hooks.on_receipt(&receipt);
            Ok(receipt)
        }

        async fn send_transaction(&self, _to: Address, _data: Bytes) -> DeployResult<CallReceipt> {
            Err(DeployError::Rpc("not supported".to_string()))
        }

        async fn call(&self, _to: Address, _data: Bytes) -> DeployResult<Bytes> {
            *self.reads.lock().unwrap() += 1;
            if self.fail_reads {
                return Err(DeployError::Rpc("connection refused".to_string()));
            }
            let config = TokenConfig::new(18, self.existing.unwrap_or_else(Address::zero));
            Ok(Bytes::from(ethers::abi::encode(&[config.to_token()])))
        }
    }

    fn artifacts() -> ArtifactStore {
        let artifact = ContractArtifact::from_json(
            r#"{
                "abi": [{
                    "type": "constructor",
                    "stateMutability": "nonpayable",
                    "inputs": [
                        { "name": "_name", "type": "string" },
                        { "name": "_symbol", "type": "string" },
                        { "name": "_decimals", "type": "uint8" },
                        { "name": "_underlying", "type": "address" },
                        { "name": "_vault", "type": "address" },
                        { "name": "_minter", "type": "address" }
                    ]
                }],
                "bytecode": "0x6080604052"
            }"#,
        )
        .unwrap();
        ArtifactStore::new().with(ContractKind::BridgeToken, artifact)
    }

    fn controller(
        client: Arc<StubClient>,
    ) -> (CrosschainTokenController, Arc<InMemoryTransactionLog>) {
        let orchestrator = Arc::new(DeploymentOrchestrator::new(client.clone(), artifacts()));
        let log = Arc::new(InMemoryTransactionLog::new());
        let router_config = RouterConfigContract::new(Address::repeat_byte(0x33), client);
        (
            CrosschainTokenController::new(orchestrator, log.clone(), Some(router_config)),
            log,
        )
    }

    async fn connect(controller: &mut CrosschainTokenController) {
        controller
            .set_wallet(WalletContext::connected(Address::repeat_byte(0x01), CHAIN_ID))
            .await;
        controller.set_router_address(Some(Address::repeat_byte(0x02)));
    }

    fn foo() -> UnderlyingToken {
        UnderlyingToken::new(UNDERLYING, "Foo", "FOO", 18).with_network_id(CHAIN_ID)
    }

    #[tokio::test]
    async fn test_can_deploy_with_complete_underlying() {
        let client = Arc::new(StubClient::new());
        let (mut controller, _) = controller(client);
        controller.mount().await;
        assert!(!controller.can_deploy());

        connect(&mut controller).await;
        assert!(!controller.can_deploy());

        controller.set_underlying(foo()).await;
        assert!(controller.can_deploy());
        assert_eq!(controller.vault(), Some(Address::repeat_byte(0x01)));
        assert_eq!(controller.minter(), Some(Address::repeat_byte(0x02)));
    }

    #[tokio::test]
    async fn test_unknown_decimals_never_deploys() {
        let client = Arc::new(StubClient::new());
        let (mut controller, log) = controller(client.clone());
        connect(&mut controller).await;

        let mut token = foo();
        token.decimals = -1;
        controller.set_underlying(token).await;

        assert!(!controller.can_deploy());
        assert_eq!(controller.deploy().await, None);
        assert_eq!(*client.deploys.lock().unwrap(), 0);
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_existing_config_disables_deploy() {
        let client = Arc::new(StubClient {
            existing: Some(Address::repeat_byte(0x44)),
            ..StubClient::new()
        });
        let (mut controller, _) = controller(client.clone());
        connect(&mut controller).await;
        controller.set_underlying(foo()).await;

        assert!(!controller.can_deploy());
        assert_eq!(
            controller.crosschain_token_address(),
            Some(Address::repeat_byte(0x44))
        );
        assert_eq!(controller.deploy().await, None);
        assert_eq!(*client.deploys.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_skipped_for_malformed_address() {
        let client = Arc::new(StubClient::new());
        let (mut controller, _) = controller(client.clone());
        connect(&mut controller).await;
        let reads_before = *client.reads.lock().unwrap();

        controller
            .set_underlying(
                UnderlyingToken::new("0x1234", "Foo", "FOO", 18).with_network_id(CHAIN_ID),
            )
            .await;
        assert_eq!(*client.reads.lock().unwrap(), reads_before);
    }

    #[tokio::test]
    async fn test_read_failure_leaves_state_unchanged() {
        let client = Arc::new(StubClient {
            fail_reads: true,
            ..StubClient::new()
        });
        let (mut controller, _) = controller(client);
        connect(&mut controller).await;
        controller.set_underlying(foo()).await;

        assert!(controller.can_deploy());
        assert_eq!(controller.crosschain_token_address(), None);
        assert_eq!(controller.last_error(), None);
    }

    #[tokio::test]
    async fn test_successful_deploy_logs_transaction() {
        let client = Arc::new(StubClient::new());
        let (mut controller, log) = controller(client.clone());
        connect(&mut controller).await;
        controller.set_underlying(foo()).await;

        let address = controller.deploy().await;
        assert_eq!(address, Some(Address::repeat_byte(0x22)));
        assert!(!controller.is_pending());
        assert!(!controller.can_deploy());

        let records = log.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].hash, TxHash::repeat_byte(0xaa));
        assert_eq!(
            records[0].summary,
            "Deployment: chain 43114; CROSSCHAIN TOKEN CrosschainFoo 0x2222222222222222222222222222222222222222"
        );

        // 已有跨链地址，不会重复部署
        assert_eq!(controller.deploy().await, None);
        assert_eq!(*client.deploys.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_deploy_resets_pending() {
        let client = Arc::new(StubClient {
            fail_deploy: true,
            ..StubClient::new()
        });
        let (mut controller, log) = controller(client.clone());
        connect(&mut controller).await;
        controller.set_underlying(foo()).await;

        assert_eq!(controller.deploy().await, None);
        assert!(!controller.is_pending());
        assert!(controller.can_deploy());
        assert!(controller.last_error().unwrap().contains("insufficient funds"));
        assert!(log.is_empty().await);
    }

    #[tokio::test]
    async fn test_changing_underlying_clears_known_address() {
        let client = Arc::new(StubClient::new());
        let (mut controller, _) = controller(client);
        connect(&mut controller).await;
        controller.set_underlying(foo()).await;
        controller.deploy().await;
        assert!(!controller.can_deploy());

        controller
            .set_underlying(
                UnderlyingToken::new("0x3333333333333333333333333333333333333333", "Bar", "BAR", 6)
                    .with_network_id(CHAIN_ID),
            )
            .await;
        assert!(controller.can_deploy());
    }

    #[tokio::test]
    async fn test_pending_is_visible_while_deploying() {
        let client = Arc::new(StubClient::new());
        let (mut controller, _) = controller(client.clone());
        connect(&mut controller).await;
        controller.set_underlying(foo()).await;

        let watcher = controller.pending_watcher();
        client.watch_pending(controller.pending_watcher());
        assert!(!*watcher.borrow());

        assert!(controller.deploy().await.is_some());

        assert_eq!(*client.pending_seen.lock().unwrap(), vec![true]);
        assert!(!*watcher.borrow());
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_pending_is_visible_while_failing_deploy() {
        let client = Arc::new(StubClient {
            fail_deploy: true,
            ..StubClient::new()
        });
        let (mut controller, _) = controller(client.clone());
        connect(&mut controller).await;
        controller.set_underlying(foo()).await;

        let watcher = controller.pending_watcher();
        client.watch_pending(controller.pending_watcher());

        assert_eq!(controller.deploy().await, None);

        assert_eq!(*client.pending_seen.lock().unwrap(), vec![true]);
        assert!(!*watcher.borrow());
        assert!(!controller.is_pending());
    }

    #[tokio::test]
    async fn test_read_skipped_without_network_id() {
        let client = Arc::new(StubClient {
            existing: Some(Address::repeat_byte(0x44)),
            ..StubClient::new()
        });
        let (mut controller, _) = controller(client.clone());
        connect(&mut controller).await;

        // 钱包已连接，但原始代币的网络未知时不读取
        controller
            .set_underlying(UnderlyingToken::new(UNDERLYING, "Foo", "FOO", 18))
            .await;
        assert_eq!(*client.reads.lock().unwrap(), 0);
        assert_eq!(controller.crosschain_token_address(), None);
        assert!(controller.can_deploy());

        controller.set_underlying(foo()).await;
        assert_eq!(*client.reads.lock().unwrap(), 1);
        assert!(!controller.can_deploy());
    }

    #[tokio::test]
    async fn test_out_of_range_decimals_disable_deploy() {
        let client = Arc::new(StubClient::new());
        let (mut controller, _) = controller(client.clone());
        connect(&mut controller).await;

        controller
            .set_underlying(
                UnderlyingToken::new(UNDERLYING, "Foo", "FOO", 256).with_network_id(CHAIN_ID),
            )
            .await;
        assert!(!controller.can_deploy());
        assert_eq!(controller.deploy().await, None);
        assert_eq!(*client.deploys.lock().unwrap(), 0);
        assert_eq!(controller.last_error(), None);
    }
}
