//! crosschain-deployer 主入口
//! 为配置中的原始代币部署跨链代币，并可选登记到 RouterConfig

use std::sync::Arc;

use anyhow::{Context, Result};
use crosschain_deployer::{
    config::Config,
    domain::{ChainEntry, ChainRegistry, UnderlyingToken},
    error::DeployError,
    infrastructure::{logging::init_logging, ArtifactStore},
    service::{
        ChainClient, CrosschainTokenController, DeploymentOrchestrator, EthersChainClient,
        InMemoryTransactionLog, RegistrationRequest, RouterConfigContract, SignerClient,
        WalletContext,
    },
    utils::AddressValidator,
};
use ethers::providers::{Http, Provider};
use ethers::types::Address;
use ethers::utils::to_checksum;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 环境变量 + 配置文件
    dotenvy::dotenv().ok();
    let config = Config::from_env_and_file(std::env::var("CONFIG_PATH").ok())?;

    // 2. 日志（guard 持有到进程结束）
    let _log_guard = init_logging(&config.logging)?;
    config.validate()?;

    tracing::info!("Starting crosschain deployer");

    // 3. 链配置
    let registry = ChainRegistry::with_extra_chains(config.chains_file.as_deref())?;
    if let Err(problems) = registry.validate_configs() {
        for problem in &problems {
            tracing::warn!(problem = %problem, "Chain config problem");
        }
    }
    tracing::info!(chains = registry.len(), "Chain registry loaded");

    let chain = registry
        .lookup(config.network.chain_id)
        .ok_or(DeployError::ChainNotSupported(config.network.chain_id))?;
    let rpc_url = config
        .network
        .rpc_url
        .clone()
        .unwrap_or_else(|| chain.node_rpc.clone());

    // 4. 签名客户端
    let private_key = config
        .wallet
        .private_key
        .as_deref()
        .context("DEPLOYER_PRIVATE_KEY is not set")?;
    let signer = Arc::new(
        EthersChainClient::<SignerClient>::connect(&rpc_url, private_key, chain.chain_id).await?,
    );

    // 5. 合约产物与编排器
    let artifacts = ArtifactStore::load_dir(&config.artifacts.dir)?;
    let orchestrator = Arc::new(DeploymentOrchestrator::new(signer.clone(), artifacts));
    let transaction_log = Arc::new(InMemoryTransactionLog::new());

    let router_config = router_config_reader(&config, &registry, signer.clone())?;
    let router_address = config
        .router
        .router_address
        .as_deref()
        .map(AddressValidator::parse)
        .transpose()?;

    // 6. 控制器
    let mut controller = CrosschainTokenController::new(
        orchestrator.clone(),
        transaction_log.clone(),
        router_config,
    );
    controller
        .set_wallet(WalletContext {
            account: signer.account(),
            chain_id: Some(chain.chain_id),
        })
        .await;
    controller.set_router_address(router_address);
    controller.mount().await;

    match &config.deployment {
        None => tracing::info!("No deployment configured, nothing to do"),
        Some(deployment) => {
            let mut underlying = UnderlyingToken::new(
                deployment.underlying_address.clone(),
                deployment.name.clone(),
                deployment.symbol.clone(),
                deployment.decimals,
            );
            underlying.network_id = deployment.network_id;
            controller.set_underlying(underlying).await;

            if let Some(existing) = controller.crosschain_token_address() {
                tracing::info!(
                    address = ?existing,
                    explorer = %chain.address_url(&to_checksum(&existing, None)),
                    "Crosschain token already registered"
                );
            } else if !controller.can_deploy() {
                tracing::warn!(
                    underlying = %deployment.underlying_address,
                    "Deployment parameters incomplete, skipping"
                );
            } else {
                let address = match controller.deploy().await {
                    Some(address) => address,
                    None => anyhow::bail!(
                        "Crosschain token deployment failed: {}",
                        controller.last_error().unwrap_or("unknown error")
                    ),
                };
                tracing::info!(
                    address = ?address,
                    explorer = %chain.address_url(&to_checksum(&address, None)),
                    "Crosschain token deployed"
                );

                if deployment.register {
                    register(&config, chain, &orchestrator, &controller, address).await?;
                }
            }
        }
    }

    for record in transaction_log.records().await {
        tracing::info!(
            tx_hash = ?record.hash,
            summary = %record.summary,
            explorer = %chain.tx_url(&format!("{:?}", record.hash)),
            added_time = %record.added_time,
            "Transaction record"
        );
    }

    Ok(())
}

/// RouterConfig 读取句柄：与部署链相同则复用签名客户端，否则只读连接
fn router_config_reader(
    config: &Config,
    registry: &ChainRegistry,
    signer: Arc<dyn ChainClient>,
) -> Result<Option<RouterConfigContract>> {
    let Some(address) = config.router.config_address.as_deref() else {
        tracing::warn!("ROUTER_CONFIG_ADDRESS is not set, existing configs will not be read");
        return Ok(None);
    };
    let address = AddressValidator::parse(address)?;

    let chain_id = config.router.config_chain_id.unwrap_or(signer.chain_id());
    if chain_id == signer.chain_id() {
        return Ok(Some(RouterConfigContract::new(address, signer)));
    }

    let chain = registry
        .lookup(chain_id)
        .ok_or(DeployError::ChainNotSupported(chain_id))?;
    let reader = EthersChainClient::<Provider<Http>>::read_only(&chain.node_rpc, chain_id)?;
    Ok(Some(RouterConfigContract::new(address, Arc::new(reader))))
}

async fn register(
    config: &Config,
    chain: &ChainEntry,
    orchestrator: &DeploymentOrchestrator,
    controller: &CrosschainTokenController,
    token_address: Address,
) -> Result<()> {
    let router = &config.router;

    if router.config_chain_id.is_some_and(|id| id != chain.chain_id) {
        tracing::warn!(
            config_chain_id = ?router.config_chain_id,
            chain_id = chain.chain_id,
            "RouterConfig lives on another chain, skipping registration"
        );
        return Ok(());
    }

    let request = RegistrationRequest {
        router_config: AddressValidator::parse(
            router
                .config_address
                .as_deref()
                .context("ROUTER_CONFIG_ADDRESS is not set")?,
        )?,
        chain_id: chain.chain_id,
        to_chain_id: router.to_chain_id.context("TO_CHAIN_ID is not set")?,
        token_name: controller.underlying().crosschain_name(),
        decimals: controller.underlying().decimals_u8()?,
        token_address,
        mpc: AddressValidator::parse(
            router
                .mpc_address
                .as_deref()
                .context("MPC_ADDRESS is not set")?,
        )?,
        mpc_pubkey: router.mpc_pubkey.clone().context("MPC_PUBKEY is not set")?,
    };

    if !orchestrator.register_token(&request).await {
        anyhow::bail!("Token registration failed, see log for details");
    }
    Ok(())
}
