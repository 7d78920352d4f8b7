//! 合约部署编排
//!
//! 按固定顺序串行执行：部署跨链代币 → setTokenConfig → setSwapConfig → setMPCPubkey。
//! 任一步失败即停止，不重试、不回滚；后续重新执行是安全的，
//! 因为 RouterConfig 的三个 set 方法都是幂等覆盖。

use std::sync::Arc;

use ethers::abi::Token;
use ethers::types::{Address, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::domain::{token_id, DeploymentParams, SwapConfig, TokenConfig};
use crate::error::{DeployError, DeployResult};
use crate::infrastructure::artifacts::{ArtifactStore, ContractKind};
use crate::service::chain_client::{ChainClient, DeployHooks, DeployReceipt, NoopHooks};
use crate::service::router_config::RouterConfigContract;

/// 登记新代币到 RouterConfig 所需参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub router_config: Address,
    pub chain_id: u64,
    pub to_chain_id: u64,
    pub token_name: String,
    pub decimals: u8,
    pub token_address: Address,
    pub mpc: Address,
    pub mpc_pubkey: String,
}

/// 部署 + 登记
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTokenParams {
    pub deployment: DeploymentParams,
    pub to_chain_id: u64,
    pub router_config: Address,
    pub mpc: Address,
    pub mpc_pubkey: String,
}

/// 跨链代币部署结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub address: Address,
    pub chain_id: u64,
    pub hash: TxHash,
    pub name: String,
}

pub struct DeploymentOrchestrator {
    client: Arc<dyn ChainClient>,
    artifacts: ArtifactStore,
}

impl DeploymentOrchestrator {
    pub fn new(client: Arc<dyn ChainClient>, artifacts: ArtifactStore) -> Self {
        Self { client, artifacts }
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    pub fn chain_id(&self) -> u64 {
        self.client.chain_id()
    }

    /// 当前客户端上的 RouterConfig 合约句柄
    pub fn router_config(&self, address: Address) -> RouterConfigContract {
        RouterConfigContract::new(address, self.client.clone())
    }

    /// 通用部署：编码构造参数，估算 gas，广播并等待回执
    pub async fn deploy_contract(
        &self,
        kind: ContractKind,
        args: &[Token],
        hooks: &dyn DeployHooks,
    ) -> DeployResult<DeployReceipt> {
        let init_code = self.artifacts.get(kind)?.encode_deploy(args)?;

        tracing::info!(
            contract = %kind,
            chain_id = self.client.chain_id(),
            init_code_len = init_code.len(),
            "Deploying contract"
        );

        let receipt = self.client.deploy(init_code, hooks).await?;

        tracing::info!(
            contract = %kind,
            address = ?receipt.contract_address,
            tx_hash = ?receipt.tx_hash,
            "Contract deployed"
        );

        Ok(receipt)
    }

    /// 部署跨链代币 (AnyswapV6ERC20)，返回合约地址
    pub async fn deploy_bridge_token(
        &self,
        params: &DeploymentParams,
        hooks: &dyn DeployHooks,
    ) -> DeployResult<Address> {
        Ok(self.deploy_bridge_token_receipt(params, hooks).await?.contract_address)
    }

    async fn deploy_bridge_token_receipt(
        &self,
        params: &DeploymentParams,
        hooks: &dyn DeployHooks,
    ) -> DeployResult<DeployReceipt> {
        params.validate()?;
        self.ensure_signer(params.chain_id, params.account)?;

        self.deploy_contract(ContractKind::BridgeToken, &params.constructor_args(), hooks)
            .await
    }

    /// 部署测试用 ERC20 (name, symbol, decimals)
    pub async fn deploy_test_erc20(
        &self,
        name: &str,
        symbol: &str,
        decimals: u8,
        hooks: &dyn DeployHooks,
    ) -> DeployResult<Address> {
        let args = [
            Token::String(name.to_string()),
            Token::String(symbol.to_string()),
            Token::Uint(U256::from(decimals)),
        ];
        let receipt = self
            .deploy_contract(ContractKind::TestErc20, &args, hooks)
            .await?;
        Ok(receipt.contract_address)
    }

    /// 部署跨链路由 (factory, wNative, mpc)
    pub async fn deploy_router(
        &self,
        factory: Address,
        wrapped_native: Address,
        mpc: Address,
        hooks: &dyn DeployHooks,
    ) -> DeployResult<Address> {
        if mpc.is_zero() {
            return Err(DeployError::zero_address("mpc"));
        }
        let args = [
            Token::Address(factory),
            Token::Address(wrapped_native),
            Token::Address(mpc),
        ];
        let receipt = self.deploy_contract(ContractKind::Router, &args, hooks).await?;
        Ok(receipt.contract_address)
    }

    /// 部署 RouterConfig（无构造参数）
    pub async fn deploy_router_config(&self, hooks: &dyn DeployHooks) -> DeployResult<Address> {
        let receipt = self
            .deploy_contract(ContractKind::RouterConfig, &[], hooks)
            .await?;
        Ok(receipt.contract_address)
    }

    /// 部署跨链代币并返回可写入交易记录的结果
    pub async fn deploy_crosschain_erc20(
        &self,
        params: &DeploymentParams,
    ) -> DeployResult<DeploymentRecord> {
        let receipt = self.deploy_bridge_token_receipt(params, &NoopHooks).await?;

        Ok(DeploymentRecord {
            address: receipt.contract_address,
            chain_id: params.chain_id,
            hash: receipt.tx_hash,
            name: params.name.clone(),
        })
    }

    /// 登记代币：三次调用严格串行，任一失败则整体返回 false
    pub async fn register_token(&self, request: &RegistrationRequest) -> bool {
        match self.try_register_token(request).await {
            Ok(()) => {
                tracing::info!(
                    token = ?request.token_address,
                    chain_id = request.chain_id,
                    to_chain_id = request.to_chain_id,
                    "Token registered in RouterConfig"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    code = e.code().as_str(),
                    token = ?request.token_address,
                    "Token registration failed"
                );
                false
            }
        }
    }

    async fn try_register_token(&self, request: &RegistrationRequest) -> DeployResult<()> {
        if request.token_address.is_zero() {
            return Err(DeployError::zero_address("token_address"));
        }

        let contract = self.router_config(request.router_config);

        // (tokenID, chainID, TokenConfig)
        let source_token_id = token_id(request.chain_id, &request.token_name);
        let token_config = TokenConfig::new(request.decimals, request.token_address);
        contract
            .set_token_config(&source_token_id, request.chain_id, &token_config)
            .await?;

        // (tokenID, toChainID, SwapConfig)
        let target_token_id = token_id(request.to_chain_id, &request.token_name);
        contract
            .set_swap_config(
                &target_token_id,
                request.to_chain_id,
                &SwapConfig::default_limits(),
            )
            .await?;

        // (addr, pubKey)
        contract
            .set_mpc_pubkey(request.mpc, &request.mpc_pubkey)
            .await?;

        Ok(())
    }

    /// 部署跨链代币后立即登记，整个流程只报告成功与否
    pub async fn add_token(&self, params: &AddTokenParams, hooks: &dyn DeployHooks) -> bool {
        let token_address = match self.deploy_bridge_token(&params.deployment, hooks).await {
            Ok(address) => address,
            Err(e) => {
                tracing::error!(error = %e, code = e.code().as_str(), "Bridge token deployment failed");
                return false;
            }
        };

        self.register_token(&RegistrationRequest {
            router_config: params.router_config,
            chain_id: params.deployment.chain_id,
            to_chain_id: params.to_chain_id,
            token_name: params.deployment.name.clone(),
            decimals: params.deployment.decimals,
            token_address,
            mpc: params.mpc,
            mpc_pubkey: params.mpc_pubkey.clone(),
        })
        .await
    }

    fn ensure_signer(&self, chain_id: u64, account: Address) -> DeployResult<()> {
        if chain_id != self.client.chain_id() {
            return Err(DeployError::invalid_parameter(format!(
                "deployment targets chain {} but client is connected to chain {}",
                chain_id,
                self.client.chain_id()
            )));
        }
        match self.client.account() {
            Some(signer) if signer == account => Ok(()),
            Some(signer) => Err(DeployError::invalid_parameter(format!(
                "account {:?} does not match signer {:?}",
                account, signer
            ))),
            None => Err(DeployError::invalid_parameter(
                "client has no signing account",
            )),
        }
    }
}
