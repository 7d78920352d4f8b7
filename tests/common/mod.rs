//! 测试辅助模块
//! 内存中的链：部署合约分配地址，RouterConfig 调用按 ABI 解码后写入内存状态

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use crosschain_deployer::{
    domain::{SwapConfig, TokenConfig},
    error::{DeployError, DeployResult},
    infrastructure::{ArtifactStore, ContractArtifact, ContractKind},
    service::{router_config_abi, CallReceipt, ChainClient, DeployHooks, DeployReceipt},
};
use ethers::abi::Token;
use ethers::types::{Address, Bytes, TxHash, U256};

pub const CHAIN_ID: u64 = 43114;
pub const TO_CHAIN_ID: u64 = 250;
pub const UNDERLYING: &str = "0x1111111111111111111111111111111111111111";

pub fn deployer() -> Address {
    Address::repeat_byte(0x01)
}

pub fn router() -> Address {
    Address::repeat_byte(0x02)
}

pub fn router_config_address() -> Address {
    Address::repeat_byte(0x33)
}

pub fn mpc() -> Address {
    Address::repeat_byte(0x55)
}

pub const BRIDGE_TOKEN_ARTIFACT: &str = r#"{
    "abi": [{
        "type": "constructor",
        "stateMutability": "nonpayable",
        "inputs": [
            { "name": "_name", "type": "string", "internalType": "string" },
            { "name": "_symbol", "type": "string", "internalType": "string" },
            { "name": "_decimals", "type": "uint8", "internalType": "uint8" },
            { "name": "_underlying", "type": "address", "internalType": "address" },
            { "name": "_vault", "type": "address", "internalType": "address" },
            { "name": "_minter", "type": "address", "internalType": "address" }
        ]
    }],
    "bytecode": "0x608060405234801561001057600080fd5b50"
}"#;

pub const ROUTER_CONFIG_ARTIFACT: &str =
    r#"{ "abi": [], "bytecode": "0x608060405234801561001057600080fd5b51" }"#;

pub fn test_artifacts() -> ArtifactStore {
    ArtifactStore::new()
        .with(
            ContractKind::BridgeToken,
            ContractArtifact::from_json(BRIDGE_TOKEN_ARTIFACT).expect("bridge token artifact"),
        )
        .with(
            ContractKind::RouterConfig,
            ContractArtifact::from_json(ROUTER_CONFIG_ARTIFACT).expect("router config artifact"),
        )
}

/// 已部署合约
#[derive(Debug, Clone)]
pub struct DeployedContract {
    pub address: Address,
    pub init_code: Bytes,
}

#[derive(Debug, Default)]
struct ChainState {
    deployed: Vec<DeployedContract>,
    token_configs: HashMap<(String, u64), TokenConfig>,
    swap_configs: HashMap<(String, u64), SwapConfig>,
    mpc_pubkeys: HashMap<Address, String>,
    /// 按顺序记录的状态变更调用（方法名）
    sent: Vec<String>,
    reads: usize,
    tx_counter: u64,
}

/// 内存链客户端
pub struct FakeChain {
    account: Address,
    chain_id: u64,
    fail_on_send: Option<usize>,
    fail_reads: bool,
    state: Mutex<ChainState>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self {
            account: deployer(),
            chain_id: CHAIN_ID,
            fail_on_send: None,
            fail_reads: false,
            state: Mutex::new(ChainState::default()),
        }
    }

    /// 第 `index` 次（从 0 开始）状态变更调用失败
    pub fn failing_on_send(mut self, index: usize) -> Self {
        self.fail_on_send = Some(index);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// 预置 RouterConfig 中的代币配置
    pub fn with_token_config(self, token_id: &str, chain_id: u64, config: TokenConfig) -> Self {
        self.state
            .lock()
            .unwrap()
            .token_configs
            .insert((token_id.to_string(), chain_id), config);
        self
    }

    pub fn sent_methods(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn deployed(&self) -> Vec<DeployedContract> {
        self.state.lock().unwrap().deployed.clone()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    pub fn token_config(&self, token_id: &str, chain_id: u64) -> Option<TokenConfig> {
        self.state
            .lock()
            .unwrap()
            .token_configs
            .get(&(token_id.to_string(), chain_id))
            .cloned()
    }

    pub fn swap_config(&self, token_id: &str, to_chain_id: u64) -> Option<SwapConfig> {
        self.state
            .lock()
            .unwrap()
            .swap_configs
            .get(&(token_id.to_string(), to_chain_id))
            .cloned()
    }

    pub fn mpc_pubkey(&self, mpc: &Address) -> Option<String> {
        self.state.lock().unwrap().mpc_pubkeys.get(mpc).cloned()
    }
}

fn decode_call(data: &[u8]) -> DeployResult<(String, Vec<Token>)> {
    if data.len() < 4 {
        return Err(DeployError::Abi("calldata too short".to_string()));
    }
    let func = router_config_abi()
        .functions()
        .find(|f| f.short_signature()[..] == data[..4])
        .ok_or_else(|| DeployError::Abi("unknown selector".to_string()))?;
    Ok((func.name.clone(), func.decode_input(&data[4..])?))
}

fn string_arg(token: &Token) -> String {
    token.clone().into_string().expect("string argument")
}

fn uint_arg(token: &Token) -> u64 {
    token.clone().into_uint().expect("uint argument").as_u64()
}

fn swap_config_from_token(token: &Token) -> SwapConfig {
    let fields: Vec<U256> = token
        .clone()
        .into_tuple()
        .expect("SwapConfig tuple")
        .into_iter()
        .map(|t| t.into_uint().expect("uint field"))
        .collect();
    SwapConfig {
        maximum_swap: fields[0],
        minimum_swap: fields[1],
        big_value_threshold: fields[2],
        swap_fee_rate_per_million: fields[3],
        maximum_swap_fee: fields[4],
        minimum_swap_fee: fields[5],
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn account(&self) -> Option<Address> {
        Some(self.account)
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn deploy(&self, init_code: Bytes, hooks: &dyn DeployHooks) -> DeployResult<DeployReceipt> {
        let receipt = {
            let mut state = self.state.lock().unwrap();
            state.tx_counter += 1;
            let address = Address::from_low_u64_be(0xc0de_0000 + state.deployed.len() as u64);
            state.deployed.push(DeployedContract {
                address,
                init_code,
            });
            DeployReceipt {
                tx_hash: TxHash::from_low_u64_be(state.tx_counter),
                contract_address: address,
                block_number: Some(state.tx_counter),
                gas_used: Some(U256::from(21_000u64)),
            }
        };

        hooks.on_hash(receipt.tx_hash);
        hooks.on_receipt(&receipt);
        Ok(receipt)
    }

    async fn send_transaction(&self, _to: Address, data: Bytes) -> DeployResult<CallReceipt> {
        let (method, args) = decode_call(&data)?;

        let mut state = self.state.lock().unwrap();
        let index = state.sent.len();
        state.sent.push(method.clone());
        if self.fail_on_send == Some(index) {
            return Err(DeployError::Rpc("execution reverted".to_string()));
        }

        match method.as_str() {
            "setTokenConfig" => {
                let config = TokenConfig::from_token(args[2].clone())?;
                state
                    .token_configs
                    .insert((string_arg(&args[0]), uint_arg(&args[1])), config);
            }
            "setSwapConfig" => {
                state.swap_configs.insert(
                    (string_arg(&args[0]), uint_arg(&args[1])),
                    swap_config_from_token(&args[2]),
                );
            }
            "setMPCPubkey" => {
                let mpc = args[0].clone().into_address().expect("address argument");
                state.mpc_pubkeys.insert(mpc, string_arg(&args[1]));
            }
            other => {
                return Err(DeployError::Abi(format!("{other} is not a transaction")));
            }
        }

        state.tx_counter += 1;
        Ok(CallReceipt {
            tx_hash: TxHash::from_low_u64_be(state.tx_counter),
            block_number: Some(state.tx_counter),
            gas_used: None,
        })
    }

    async fn call(&self, _to: Address, data: Bytes) -> DeployResult<Bytes> {
        let (method, args) = decode_call(&data)?;

        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        if self.fail_reads {
            return Err(DeployError::Rpc("connection refused".to_string()));
        }
        if method != "getTokenConfig" {
            return Err(DeployError::Abi(format!("{method} is not a view")));
        }

        // 未登记的代币返回全零结构
        let config = state
            .token_configs
            .get(&(string_arg(&args[0]), uint_arg(&args[1])))
            .cloned()
            .unwrap_or(TokenConfig {
                decimals: 0,
                contract_address: Address::zero(),
                contract_version: U256::zero(),
            });
        Ok(Bytes::from(ethers::abi::encode(&[config.to_token()])))
    }
}
