//! 合约编译产物
//!
//! 读取 Truffle / Hardhat 输出的 `{ "abi": [...], "bytecode": "0x..." }` JSON，
//! 并负责构造部署交易的 init code（bytecode + ABI 编码的构造参数）。

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use ethers::abi::{Abi, Token};
use ethers::types::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};

/// 支持部署的合约
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// 跨链代币 (name, symbol, decimals, underlying, vault, minter)
    BridgeToken,
    /// 跨链路由 (factory, wNative, mpc)
    Router,
    /// 路由配置合约，无构造参数
    RouterConfig,
    /// 测试用 ERC20 (name, symbol, decimals)
    TestErc20,
}

impl ContractKind {
    pub const ALL: [ContractKind; 4] = [
        ContractKind::BridgeToken,
        ContractKind::Router,
        ContractKind::RouterConfig,
        ContractKind::TestErc20,
    ];

    /// 产物文件名（不含扩展名）
    pub fn artifact_name(&self) -> &'static str {
        match self {
            Self::BridgeToken => "AnyswapV6ERC20",
            Self::Router => "AnyswapV6Router",
            Self::RouterConfig => "RouterConfig",
            Self::TestErc20 => "InfinityERC20",
        }
    }
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.artifact_name())
    }
}

/// 单个合约的 ABI + bytecode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractArtifact {
    pub abi: Abi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse contract artifact JSON")
    }

    /// bytecode + 构造参数
    pub fn encode_deploy(&self, args: &[Token]) -> DeployResult<Bytes> {
        if self.bytecode.is_empty() {
            return Err(DeployError::invalid_parameter("artifact bytecode is empty"));
        }

        let code = self.bytecode.to_vec();
        match self.abi.constructor() {
            Some(constructor) => Ok(constructor.encode_input(code, args)?.into()),
            None if args.is_empty() => Ok(code.into()),
            None => Err(DeployError::Abi(format!(
                "contract has no constructor but {} arguments were given",
                args.len()
            ))),
        }
    }
}

/// 已加载的合约产物集合
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    artifacts: HashMap<ContractKind, ContractArtifact>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从目录加载 `{artifact_name}.json`，缺失的合约只记警告
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut store = Self::new();

        for kind in ContractKind::ALL {
            let path = dir.join(format!("{}.json", kind.artifact_name()));
            if !path.exists() {
                tracing::warn!(contract = %kind, path = ?path, "Contract artifact not found");
                continue;
            }

            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read artifact: {:?}", path))?;
            let artifact = ContractArtifact::from_json(&content)
                .with_context(|| format!("Invalid artifact: {:?}", path))?;

            tracing::debug!(contract = %kind, bytecode_len = artifact.bytecode.len(), "Loaded contract artifact");
            store.insert(kind, artifact);
        }

        Ok(store)
    }

    pub fn insert(&mut self, kind: ContractKind, artifact: ContractArtifact) {
        self.artifacts.insert(kind, artifact);
    }

    pub fn with(mut self, kind: ContractKind, artifact: ContractArtifact) -> Self {
        self.insert(kind, artifact);
        self
    }

    pub fn get(&self, kind: ContractKind) -> DeployResult<&ContractArtifact> {
        self.artifacts
            .get(&kind)
            .ok_or(DeployError::ArtifactMissing(kind.artifact_name()))
    }

    pub fn contains(&self, kind: ContractKind) -> bool {
        self.artifacts.contains_key(&kind)
    }
}
