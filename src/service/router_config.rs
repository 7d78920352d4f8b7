//! RouterConfig 合约句柄
//!
//! 只封装本系统用到的四个方法：`getTokenConfig` / `setTokenConfig` /
//! `setSwapConfig` / `setMPCPubkey`。ABI 内置，不依赖编译产物。

use std::sync::Arc;

use ethers::abi::{Abi, Function, Token};
use ethers::types::{Address, Bytes, U256};
use once_cell::sync::Lazy;

use crate::domain::{SwapConfig, TokenConfig};
use crate::error::{DeployError, DeployResult};
use crate::service::chain_client::{CallReceipt, ChainClient};

static ROUTER_CONFIG_ABI: Lazy<Abi> = Lazy::new(|| {
    let token_config = serde_json::json!([
        { "name": "Decimals", "type": "uint8" },
        { "name": "ContractAddress", "type": "address" },
        { "name": "ContractVersion", "type": "uint256" }
    ]);
    let swap_config = serde_json::json!([
        { "name": "MaximumSwap", "type": "uint256" },
        { "name": "MinimumSwap", "type": "uint256" },
        { "name": "BigValueThreshold", "type": "uint256" },
        { "name": "SwapFeeRatePerMillion", "type": "uint256" },
        { "name": "MaximumSwapFee", "type": "uint256" },
        { "name": "MinimumSwapFee", "type": "uint256" }
    ]);

    let abi = serde_json::json!([
        {
            "type": "function",
            "name": "getTokenConfig",
            "stateMutability": "view",
            "inputs": [
                { "name": "tokenID", "type": "string" },
                { "name": "chainID", "type": "uint256" }
            ],
            "outputs": [
                { "name": "", "type": "tuple", "components": token_config }
            ]
        },
        {
            "type": "function",
            "name": "setTokenConfig",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "tokenID", "type": "string" },
                { "name": "chainID", "type": "uint256" },
                { "name": "config", "type": "tuple", "components": token_config }
            ],
            "outputs": [{ "name": "", "type": "bool" }]
        },
        {
            "type": "function",
            "name": "setSwapConfig",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "tokenID", "type": "string" },
                { "name": "toChainID", "type": "uint256" },
                { "name": "config", "type": "tuple", "components": swap_config }
            ],
            "outputs": [{ "name": "", "type": "bool" }]
        },
        {
            "type": "function",
            "name": "setMPCPubkey",
            "stateMutability": "nonpayable",
            "inputs": [
                { "name": "addr", "type": "address" },
                { "name": "pubkey", "type": "string" }
            ],
            "outputs": [{ "name": "", "type": "bool" }]
        }
    ]);

    serde_json::from_value(abi).expect("valid RouterConfig ABI literal")
});

/// 内置的 RouterConfig ABI
pub fn router_config_abi() -> &'static Abi {
    &ROUTER_CONFIG_ABI
}

fn function(name: &str) -> DeployResult<&'static Function> {
    Ok(ROUTER_CONFIG_ABI.function(name)?)
}

/// RouterConfig 合约实例（地址 + 所在链的客户端）
#[derive(Clone)]
pub struct RouterConfigContract {
    address: Address,
    client: Arc<dyn ChainClient>,
}

impl RouterConfigContract {
    pub fn new(address: Address, client: Arc<dyn ChainClient>) -> Self {
        Self { address, client }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.client.chain_id()
    }

    /// 读取代币配置，未登记时 `contract_address` 为零地址
    pub async fn get_token_config(&self, token_id: &str, chain_id: u64) -> DeployResult<TokenConfig> {
        let func = function("getTokenConfig")?;
        let data = func.encode_input(&[
            Token::String(token_id.to_string()),
            Token::Uint(U256::from(chain_id)),
        ])?;

        let output = self.client.call(self.address, Bytes::from(data)).await?;
        let token = func
            .decode_output(&output)?
            .into_iter()
            .next()
            .ok_or_else(|| DeployError::Abi("getTokenConfig returned no value".to_string()))?;

        TokenConfig::from_token(token)
    }

    pub async fn set_token_config(
        &self,
        token_id: &str,
        chain_id: u64,
        config: &TokenConfig,
    ) -> DeployResult<CallReceipt> {
        self.send(
            "setTokenConfig",
            &[
                Token::String(token_id.to_string()),
                Token::Uint(U256::from(chain_id)),
                config.to_token(),
            ],
        )
        .await
    }

    pub async fn set_swap_config(
        &self,
        token_id: &str,
        to_chain_id: u64,
        config: &SwapConfig,
    ) -> DeployResult<CallReceipt> {
        self.send(
            "setSwapConfig",
            &[
                Token::String(token_id.to_string()),
                Token::Uint(U256::from(to_chain_id)),
                config.to_token(),
            ],
        )
        .await
    }

    pub async fn set_mpc_pubkey(&self, mpc: Address, pubkey: &str) -> DeployResult<CallReceipt> {
        self.send(
            "setMPCPubkey",
            &[Token::Address(mpc), Token::String(pubkey.to_string())],
        )
        .await
    }

    async fn send(&self, method: &str, args: &[Token]) -> DeployResult<CallReceipt> {
        let data = function(method)?.encode_input(args)?;
        tracing::debug!(contract = ?self.address, method, "Calling RouterConfig");
        self.client
            .send_transaction(self.address, Bytes::from(data))
            .await
    }
}
