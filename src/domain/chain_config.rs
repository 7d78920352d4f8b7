//! 多链配置模块
//!
//! 每条链的 RPC、浏览器、代币列表以及跨链桥合约地址。
//! 注册表在启动时构建，之后只读。

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// 代币列表服务前缀，完整地址为 `TOKEN_LIST_URL_BASE + chain_id`
pub const TOKEN_LIST_URL_BASE: &str = "https://list.anyswap.exchange/tokenlist/";

/// 当前启用的跨链桥版本
pub const USE_VERSION: BridgeVersion = BridgeVersion::V1;

/// 跨链桥合约版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum BridgeVersion {
    #[default]
    V1,
    V2,
}

/// 网络类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    #[default]
    Main,
    Test,
}

/// 某一桥版本下的合约地址集合（未部署的字段为 None）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeTokenSet {
    pub bridge_init_token: Option<Address>,
    pub bridge_router_token: Option<Address>,
    pub bridge_init_chain: Option<u64>,
    pub swap_router_token: Option<Address>,
    pub swap_init_token: Option<Address>,
}

/// 代币列表条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenListEntry {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// 单条链的完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    /// EIP-155 链 ID
    pub chain_id: u64,
    pub name: String,
    /// 原生币符号 (ETH, BNB, AVAX ...)
    pub symbol: String,
    #[serde(default)]
    pub network_name: String,
    #[serde(default)]
    pub network_type: NetworkType,
    pub node_rpc: String,
    /// 区块浏览器根地址
    pub explorer: String,
    #[serde(default)]
    pub app_name: String,
    #[serde(default)]
    pub old_app_name: String,
    #[serde(default)]
    pub base_currency: String,
    #[serde(default)]
    pub token_list_url: String,
    #[serde(default)]
    pub token_list: Vec<TokenListEntry>,
    #[serde(default)]
    pub bridge_version: BridgeVersion,
    #[serde(default)]
    pub bridge: BridgeTokenSet,
    #[serde(default)]
    pub multicall_token: Option<Address>,
    #[serde(default)]
    pub v1_factory_token: Option<Address>,
    #[serde(default)]
    pub v2_factory_token: Option<Address>,
    #[serde(default)]
    pub timelock: Option<Address>,
    /// 钱包是否支持切换到该网络
    #[serde(default)]
    pub is_switch: bool,
    #[serde(default)]
    pub suffix: String,
}

impl ChainEntry {
    fn explorer_base(&self) -> &str {
        self.explorer.trim_end_matches('/')
    }

    /// 交易详情页
    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base(), hash)
    }

    /// 地址详情页
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_base(), address)
    }

    /// 区块详情页
    pub fn block_url(&self, block: u64) -> String {
        format!("{}/block/{}", self.explorer_base(), block)
    }

    pub fn is_testnet(&self) -> bool {
        self.network_type == NetworkType::Test
    }

    /// 查找代币列表中的某个代币
    pub fn find_token(&self, address: &Address) -> Option<&TokenListEntry> {
        self.token_list.iter().find(|t| &t.address == address)
    }
}

/// 内置链的精简描述，展开为 [`ChainEntry`]
struct BuiltinChain {
    chain_id: u64,
    name: &'static str,
    symbol: &'static str,
    network_name: &'static str,
    node_rpc: &'static str,
    explorer: &'static str,
}

impl BuiltinChain {
    fn into_entry(self) -> ChainEntry {
        ChainEntry {
            chain_id: self.chain_id,
            name: self.name.to_string(),
            symbol: self.symbol.to_string(),
            network_name: self.network_name.to_string(),
            network_type: NetworkType::Main,
            node_rpc: self.node_rpc.to_string(),
            explorer: self.explorer.to_string(),
            app_name: "HTswap LP".to_string(),
            old_app_name: "Anyswap V1".to_string(),
            base_currency: "ANY".to_string(),
            token_list_url: format!("{TOKEN_LIST_URL_BASE}{}", self.chain_id),
            token_list: Vec::new(),
            bridge_version: USE_VERSION,
            bridge: BridgeTokenSet::default(),
            multicall_token: None,
            v1_factory_token: None,
            v2_factory_token: None,
            timelock: None,
            is_switch: true,
            suffix: self.symbol.to_string(),
        }
    }
}

/// 额外链配置文件格式（TOML，`[[chains]]` 数组）
#[derive(Debug, Deserialize)]
struct ChainFile {
    #[serde(default)]
    chains: Vec<ChainEntry>,
}

/// 链配置注册表
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    configs: BTreeMap<u64, ChainEntry>,
}

impl ChainRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        let mut registry = Self {
            configs: BTreeMap::new(),
        };

        registry.register_default_chains();
        registry
    }

    /// 内置链 + 可选的额外链配置文件（同 chain_id 覆盖内置配置）
    pub fn with_extra_chains(path: Option<&Path>) -> Result<Self> {
        let mut registry = Self::new();

        let Some(path) = path else {
            return Ok(registry);
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chains file: {:?}", path))?;
        let file: ChainFile =
            toml::from_str(&content).with_context(|| "Failed to parse chains file as TOML")?;

        let mut seen = HashSet::new();
        for mut entry in file.chains {
            if !seen.insert(entry.chain_id) {
                anyhow::bail!(
                    "Duplicate chain_id {} in chains file {:?}",
                    entry.chain_id,
                    path
                );
            }
            if entry.token_list_url.is_empty() {
                entry.token_list_url = format!("{TOKEN_LIST_URL_BASE}{}", entry.chain_id);
            }
            tracing::debug!(chain_id = entry.chain_id, name = %entry.name, "Registering chain from file");
            registry.register(entry);
        }

        Ok(registry)
    }

    fn register_default_chains(&mut self) {
        let builtin = [
            BuiltinChain {
                chain_id: 1,
                name: "Ethereum",
                symbol: "ETH",
                network_name: "ETH mainnet",
                node_rpc: "https://eth.llamarpc.com",
                explorer: "https://etherscan.io",
            },
            BuiltinChain {
                chain_id: 56,
                name: "BNB Smart Chain",
                symbol: "BNB",
                network_name: "BSC mainnet",
                node_rpc: "https://bsc-dataseed.binance.org/",
                explorer: "https://bscscan.com",
            },
            BuiltinChain {
                chain_id: 137,
                name: "Polygon",
                symbol: "MATIC",
                network_name: "Polygon mainnet",
                node_rpc: "https://polygon-rpc.com/",
                explorer: "https://polygonscan.com",
            },
            BuiltinChain {
                chain_id: 250,
                name: "Fantom",
                symbol: "FTM",
                network_name: "FTM mainnet",
                node_rpc: "https://rpc.ftm.tools/",
                explorer: "https://ftmscan.com",
            },
            BuiltinChain {
                chain_id: 42161,
                name: "Arbitrum One",
                symbol: "ETH",
                network_name: "Arbitrum mainnet",
                node_rpc: "https://arb1.arbitrum.io/rpc",
                explorer: "https://arbiscan.io",
            },
            BuiltinChain {
                chain_id: 43114,
                name: "Avalanche",
                symbol: "AVAX",
                network_name: "AVAX mainnet",
                node_rpc: "https://api.avax.network/ext/bc/C/rpc",
                explorer: "https://cchain.explorer.avax.network/",
            },
        ];

        for chain in builtin {
            self.register(chain.into_entry());
        }
    }

    fn register(&mut self, entry: ChainEntry) {
        self.configs.insert(entry.chain_id, entry);
    }

    /// 通过 chain_id 获取配置，未注册返回 None
    pub fn lookup(&self, chain_id: u64) -> Option<&ChainEntry> {
        self.configs.get(&chain_id)
    }

    /// 通过原生币符号获取配置（不区分大小写，多条链同符号时取 chain_id 最小者）
    pub fn get_by_symbol(&self, symbol: &str) -> Option<&ChainEntry> {
        self.configs
            .values()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
    }

    /// 按 chain_id 升序列出所有链
    pub fn list_all(&self) -> Vec<&ChainEntry> {
        self.configs.values().collect()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// 验证链配置完整性，收集全部问题后一次性返回
    pub fn validate_configs(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (chain_id, config) in &self.configs {
            if config.name.is_empty() {
                errors.push(format!("Chain {} has empty name", chain_id));
            }
            if config.symbol.is_empty() {
                errors.push(format!("Chain {} has empty symbol", chain_id));
            }

            if !config.node_rpc.starts_with("https://") && !config.node_rpc.starts_with("http://")
            {
                errors.push(format!(
                    "Chain {} has invalid node_rpc: {:?}",
                    config.name, config.node_rpc
                ));
            }
            if config.explorer.is_empty() {
                errors.push(format!("Chain {} has empty explorer", config.name));
            }

            let bridge_addresses = [
                ("bridge_init_token", config.bridge.bridge_init_token),
                ("bridge_router_token", config.bridge.bridge_router_token),
                ("swap_router_token", config.bridge.swap_router_token),
                ("swap_init_token", config.bridge.swap_init_token),
            ];
            for (field, address) in bridge_addresses {
                if address.is_some_and(|a| a.is_zero()) {
                    errors.push(format!("Chain {} has zero {}", config.name, field));
                }
            }

            for token in &config.token_list {
                if token.address.is_zero() || token.symbol.is_empty() {
                    errors.push(format!(
                        "Chain {} has invalid token list entry: {:?}",
                        config.name, token
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}
