//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::utils::AddressValidator;

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub router: RouterSettings,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    /// 额外链配置文件（TOML）
    #[serde(default)]
    pub chains_file: Option<PathBuf>,
    /// 待部署的原始代币（可选）
    #[serde(default)]
    pub deployment: Option<DeploymentConfig>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    pub enable_file_logging: bool,
    pub log_file_path: Option<String>,
}

/// 目标网络
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// 部署交易所在链
    pub chain_id: u64,
    /// 覆盖注册表中的 node_rpc
    pub rpc_url: Option<String>,
}

/// 签名钱包
///
/// 私钥默认只从环境变量读取，不建议写入配置文件。
#[derive(Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    pub private_key: Option<String>,
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// 跨链路由相关地址
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// RouterConfig 合约地址
    pub config_address: Option<String>,
    /// RouterConfig 合约所在链
    pub config_chain_id: Option<u64>,
    /// 当前链的 Router 合约（作为跨链代币的 minter）
    pub router_address: Option<String>,
    /// MPC 地址与公钥
    pub mpc_address: Option<String>,
    pub mpc_pubkey: Option<String>,
    /// 兑换配置的目标链
    pub to_chain_id: Option<u64>,
}

/// 合约编译产物目录（{abi, bytecode} JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
}

/// 无界面运行时要处理的原始代币
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub underlying_address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: i32,
    pub network_id: Option<u64>,
    /// 部署后同时登记到 RouterConfig
    #[serde(default)]
    pub register: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            enable_file_logging: std::env::var("LOG_FILE_ENABLED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
            log_file_path: std::env::var("LOG_FILE_PATH").ok(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: std::env::var("CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(43114),
            rpc_url: std::env::var("RPC_URL").ok(),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key: std::env::var("DEPLOYER_PRIVATE_KEY").ok(),
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            config_address: std::env::var("ROUTER_CONFIG_ADDRESS").ok(),
            config_chain_id: std::env::var("ROUTER_CONFIG_CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok()),
            router_address: std::env::var("ROUTER_ADDRESS").ok(),
            mpc_address: std::env::var("MPC_ADDRESS").ok(),
            mpc_pubkey: std::env::var("MPC_PUBKEY").ok(),
            to_chain_id: std::env::var("TO_CHAIN_ID")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: std::env::var("ARTIFACTS_DIR")
                .unwrap_or_else(|_| "./artifacts".into())
                .into(),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            logging: LoggingConfig::default(),
            network: NetworkConfig::default(),
            wallet: WalletConfig::default(),
            router: RouterSettings::default(),
            artifacts: ArtifactsConfig::default(),
            chains_file: std::env::var("CHAINS_FILE").ok().map(PathBuf::from),
            deployment: None,
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    ///
    /// 私钥始终允许由环境变量补充。
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                let env_key = config.wallet.private_key.take();
                config = Self::from_file(path)?;
                if config.wallet.private_key.is_none() {
                    config.wallet.private_key = env_key;
                }
            } else {
                tracing::warn!(path = ?path.as_ref(), "Config file not found, using environment only");
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if let Some(rpc_url) = &self.network.rpc_url {
            if !rpc_url.starts_with("http://") && !rpc_url.starts_with("https://") {
                anyhow::bail!("RPC_URL must be an http(s) URL: {}", rpc_url);
            }
        }

        let addresses = [
            ("ROUTER_CONFIG_ADDRESS", &self.router.config_address),
            ("ROUTER_ADDRESS", &self.router.router_address),
            ("MPC_ADDRESS", &self.router.mpc_address),
        ];
        for (name, address) in addresses {
            if let Some(address) = address {
                if !AddressValidator::is_valid(address) {
                    anyhow::bail!("{} is not a valid EVM address: {}", name, address);
                }
            }
        }

        Ok(())
    }
}
